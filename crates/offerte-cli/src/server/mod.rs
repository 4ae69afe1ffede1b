//! HTTP server: JSON API over the invoice service plus report rendering.

pub mod handlers;
pub mod routes;

pub use routes::{create_router, AppState};
