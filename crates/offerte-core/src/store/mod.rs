//! Invoice document store.
//!
//! Documents are keyed by a store-assigned id and overwritten in place on
//! update (last writer wins). Listing returns the newest invoice first.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::StoreError;
use crate::models::invoice::{Invoice, InvoiceDraft};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence backend for invoices.
pub trait InvoiceStore: Send + Sync {
    /// Store a new invoice and return it with its assigned id.
    fn create(&self, draft: InvoiceDraft) -> Result<Invoice>;

    /// Load an invoice, `None` when the id is unknown.
    fn get(&self, id: &str) -> Result<Option<Invoice>>;

    /// Overwrite an existing invoice.
    fn update(&self, id: &str, draft: InvoiceDraft) -> Result<Invoice>;

    /// Delete an invoice. Returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// All invoices, newest first.
    fn list(&self) -> Result<Vec<Invoice>>;
}

/// Generate a fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Current time at the precision the stores keep.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
pub(crate) mod conformance {
    //! Behaviour every store implementation must share.

    use super::*;
    use crate::models::invoice::{LineItem, VatRate};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn draft(client: &str) -> InvoiceDraft {
        let mut draft = InvoiceDraft::default();
        draft.project_details.client_name = client.to_string();
        draft.sections[0].items.push(LineItem {
            quantity: Decimal::from(2),
            price: Decimal::from(100),
            vat_rate: VatRate::STANDARD,
            ..LineItem::new(1)
        });
        draft
    }

    pub fn create_then_get(store: &dyn InvoiceStore) {
        let created = store.create(draft("Jansen")).unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.totals.grand.total, Decimal::from(242));
        assert_eq!(created.created_at, created.updated_at);

        let loaded = store.get(&created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    pub fn get_unknown(store: &dyn InvoiceStore) {
        assert!(store.get("does-not-exist").unwrap().is_none());
    }

    pub fn update_overwrites(store: &dyn InvoiceStore) {
        let created = store.create(draft("Jansen")).unwrap();

        let mut changed = created.to_draft();
        changed.project_details.client_name = "De Vries".to_string();
        changed.sections[0].items[0].quantity = Decimal::from(3);

        let updated = store.update(&created.id, changed).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.totals.grand.subtotal, Decimal::from(300));

        let loaded = store.get(&created.id).unwrap().unwrap();
        assert_eq!(loaded.project_details.client_name, "De Vries");
    }

    pub fn update_unknown(store: &dyn InvoiceStore) {
        let err = store.update("missing", draft("X")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
    }

    pub fn delete_is_idempotent(store: &dyn InvoiceStore) {
        let created = store.create(draft("Jansen")).unwrap();
        assert!(store.delete(&created.id).unwrap());
        assert!(!store.delete(&created.id).unwrap());
        assert!(store.get(&created.id).unwrap().is_none());
    }

    pub fn list_newest_first(store: &dyn InvoiceStore) {
        let first = store.create(draft("Eerste")).unwrap();
        let second = store.create(draft("Tweede")).unwrap();
        let third = store.create(draft("Derde")).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }
}
