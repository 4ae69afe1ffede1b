//! Error types for the offerte-core library.

use thiserror::Error;

/// Errors related to the invoice document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No invoice with the given id exists.
    #[error("invoice not found: {0}")]
    NotFound(String),

    /// The underlying database failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored document could not be encoded or decoded.
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The store lock was poisoned by a panicking writer.
    #[error("store is unavailable: {0}")]
    Unavailable(String),
}

/// Guard refusals raised by the section editor.
///
/// These never mutate state; callers surface them as a warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Deleting would leave the invoice without sections.
    #[error("you must keep at least one section")]
    SoleSection,

    /// The first section cannot be deleted.
    #[error("section {0} is protected and cannot be deleted")]
    ProtectedSection(String),

    /// Header image slot outside the supported range.
    #[error("header image index {index} out of range (max {max})")]
    HeaderImageIndex { index: usize, max: usize },
}

/// Errors related to report rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The template failed to parse or render.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Errors related to image payloads.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Reading the image file failed.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}
