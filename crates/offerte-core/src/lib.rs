//! Core library for building construction quotations.
//!
//! This crate provides:
//! - Quotation data models (sections, line items, project details)
//! - The totals calculator (subtotal, VAT per rate, total)
//! - A pure section/item editor driven by commands
//! - Invoice persistence (SQLite and in-memory stores)
//! - HTML report rendering at A4 page geometry

pub mod editor;
pub mod error;
pub mod media;
pub mod models;
pub mod report;
pub mod service;
pub mod store;
pub mod totals;

pub use editor::{Command, EditorState, ItemUpdate, ProjectUpdate};
pub use error::{EditError, MediaError, RenderError, StoreError};
pub use media::{ImageLocation, ImageWarning};
pub use models::config::OfferteConfig;
pub use models::invoice::{
    CalculatedSection, Invoice, InvoiceDraft, InvoiceSummary, InvoiceTotals, LineItem,
    ProjectDetails, Section, VatRate,
};
pub use report::ReportRenderer;
pub use service::{InvoiceService, SaveOutcome};
pub use store::{InvoiceStore, MemoryStore, SqliteStore};
pub use totals::{calculate_section_totals, CalculationResult};
