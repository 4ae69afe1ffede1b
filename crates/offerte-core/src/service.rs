//! Persistence glue between editors and the invoice store.
//!
//! The service enforces the inline image policy before every write and keeps
//! the stored totals in sync with the sections.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::media::{strip_oversized_images, ImageWarning};
use crate::models::config::MediaConfig;
use crate::models::invoice::{Invoice, InvoiceDraft, InvoiceSummary};
use crate::store::{InvoiceStore, Result};

/// Result of a create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    /// The invoice as stored.
    pub invoice: Invoice,

    /// Images dropped before the write.
    pub warnings: Vec<ImageWarning>,
}

/// Invoice operations over a shared store.
#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
    image_limit: usize,
}

impl InvoiceService {
    /// Create a service using the configured image limit.
    pub fn new(store: Arc<dyn InvoiceStore>, media: &MediaConfig) -> Self {
        Self {
            store,
            image_limit: media.max_inline_image_bytes,
        }
    }

    /// Save a new invoice.
    pub fn create(&self, mut draft: InvoiceDraft) -> Result<SaveOutcome> {
        let warnings = strip_oversized_images(&mut draft, self.image_limit);
        let invoice = self.store.create(draft)?;
        info!(
            id = %invoice.id,
            total = %invoice.totals.grand.total,
            dropped_images = warnings.len(),
            "Saved new invoice"
        );
        Ok(SaveOutcome { invoice, warnings })
    }

    /// Overwrite an existing invoice.
    pub fn update(&self, id: &str, mut draft: InvoiceDraft) -> Result<SaveOutcome> {
        let warnings = strip_oversized_images(&mut draft, self.image_limit);
        let invoice = self.store.update(id, draft).inspect_err(|e| {
            if matches!(e, StoreError::NotFound(_)) {
                warn!(id, "Update of unknown invoice");
            }
        })?;
        info!(
            id = %invoice.id,
            total = %invoice.totals.grand.total,
            dropped_images = warnings.len(),
            "Updated invoice"
        );
        Ok(SaveOutcome { invoice, warnings })
    }

    /// Load one invoice, treating a missing id as an error.
    pub fn require(&self, id: &str) -> Result<Invoice> {
        self.store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Delete one invoice. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.store.delete(id)?;
        if removed {
            info!(id, "Deleted invoice");
        }
        Ok(removed)
    }

    /// Summaries of every invoice, newest first.
    pub fn list(&self) -> Result<Vec<InvoiceSummary>> {
        Ok(self.store.list()?.iter().map(Invoice::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::LineItem;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn service(limit: usize) -> InvoiceService {
        InvoiceService::new(
            Arc::new(MemoryStore::new()),
            &MediaConfig {
                max_inline_image_bytes: limit,
            },
        )
    }

    #[test]
    fn test_create_drops_oversized_images() {
        let service = service(64);
        let mut draft = InvoiceDraft::default();
        draft.sections[0].items.push(LineItem {
            image_url: Some(format!("data:image/png;base64,{}", "A".repeat(100))),
            ..LineItem::new(1)
        });

        let outcome = service.create(draft).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.invoice.sections[0].items[0].image_url, None);

        let stored = service.require(&outcome.invoice.id).unwrap();
        assert_eq!(stored.sections[0].items[0].image_url, None);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let err = service(1024)
            .update("nope", InvoiceDraft::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_list_returns_summaries() {
        let service = service(1024);
        let mut draft = InvoiceDraft::default();
        draft.project_details.client_name = "Bakker".into();
        service.create(InvoiceDraft::default()).unwrap();
        let newest = service.create(draft).unwrap().invoice;

        let list = service.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newest.id);
        assert_eq!(list[0].client_name, "Bakker");
    }

    #[test]
    fn test_require_and_delete() {
        let service = service(1024);
        let id = service.create(InvoiceDraft::default()).unwrap().invoice.id;

        assert!(service.delete(&id).unwrap());
        assert!(matches!(service.require(&id), Err(StoreError::NotFound(_))));
        assert!(!service.delete(&id).unwrap());
    }
}
