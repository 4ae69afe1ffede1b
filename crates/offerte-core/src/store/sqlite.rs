//! SQLite-backed invoice store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::SecondsFormat;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{new_id, now, InvoiceStore, Result};
use crate::error::StoreError;
use crate::models::invoice::{Invoice, InvoiceDraft};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_invoices_created ON invoices(created_at);
"#;

/// Invoice store keeping one JSON document per row.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(mode, "journal mode");
        info!("Opened invoice store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(conn: &Connection, invoice: &Invoice) -> Result<()> {
        let document = serde_json::to_string(invoice)?;
        conn.execute(
            "INSERT INTO invoices (id, document, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at",
            params![
                invoice.id,
                document,
                invoice.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                invoice.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(())
    }

    fn read(conn: &Connection, id: &str) -> Result<Option<Invoice>> {
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM invoices WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }
}

impl InvoiceStore for SqliteStore {
    fn create(&self, draft: InvoiceDraft) -> Result<Invoice> {
        let conn = self.lock()?;
        let timestamp = now();
        let invoice = Invoice::assemble(new_id(), draft, timestamp, timestamp);
        Self::write(&conn, &invoice)?;
        debug!(id = %invoice.id, "created invoice");
        Ok(invoice)
    }

    fn get(&self, id: &str) -> Result<Option<Invoice>> {
        let conn = self.lock()?;
        Self::read(&conn, id)
    }

    fn update(&self, id: &str, draft: InvoiceDraft) -> Result<Invoice> {
        let conn = self.lock()?;
        let existing =
            Self::read(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let invoice = Invoice::assemble(id, draft, existing.created_at, now());
        Self::write(&conn, &invoice)?;
        debug!(id, "updated invoice");
        Ok(invoice)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn list(&self) -> Result<Vec<Invoice>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT document FROM invoices ORDER BY created_at DESC, rowid DESC")?;

        let documents = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        documents
            .iter()
            .map(|doc| serde_json::from_str(doc).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[test]
    fn test_create_then_get() {
        conformance::create_then_get(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_get_unknown() {
        conformance::get_unknown(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_update_overwrites() {
        conformance::update_overwrites(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_update_unknown() {
        conformance::update_unknown(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_delete_is_idempotent() {
        conformance::delete_is_idempotent(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_list_newest_first() {
        conformance::list_newest_first(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("offerte.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.create(InvoiceDraft::default()).unwrap().id
        };

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get(&id).unwrap().is_some());
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
