//! In-process invoice store, used by tests and `--in-memory` servers.

use std::sync::{Mutex, MutexGuard};

use super::{new_id, now, InvoiceStore, Result};
use crate::error::StoreError;
use crate::models::invoice::{Invoice, InvoiceDraft};

/// Invoice store backed by a vector, kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    invoices: Mutex<Vec<Invoice>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Invoice>>> {
        self.invoices
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl InvoiceStore for MemoryStore {
    fn create(&self, draft: InvoiceDraft) -> Result<Invoice> {
        let timestamp = now();
        let invoice = Invoice::assemble(new_id(), draft, timestamp, timestamp);
        self.lock()?.push(invoice.clone());
        Ok(invoice)
    }

    fn get(&self, id: &str) -> Result<Option<Invoice>> {
        Ok(self.lock()?.iter().find(|i| i.id == id).cloned())
    }

    fn update(&self, id: &str, draft: InvoiceDraft) -> Result<Invoice> {
        let mut invoices = self.lock()?;
        let slot = invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        *slot = Invoice::assemble(id, draft, slot.created_at, now());
        Ok(slot.clone())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut invoices = self.lock()?;
        let before = invoices.len();
        invoices.retain(|i| i.id != id);
        Ok(invoices.len() < before)
    }

    fn list(&self) -> Result<Vec<Invoice>> {
        let mut invoices = self.lock()?.clone();
        // Stable sort keeps insertion order on ties; reverse for newest first.
        invoices.reverse();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }
}
