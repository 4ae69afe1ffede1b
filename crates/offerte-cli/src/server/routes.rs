//! HTTP Routes
//!
//! Axum router configuration for the quotation server.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use offerte_core::{InvoiceService, ReportRenderer};

use super::handlers;

/// Application state shared across handlers
pub struct AppState {
    pub service: InvoiceService,
    pub renderer: ReportRenderer,
}

impl AppState {
    pub fn new(service: InvoiceService, renderer: ReportRenderer) -> Self {
        Self { service, renderer }
    }
}

/// Create the main application router
///
/// # Routes
///
/// - `GET /health` - Basic health check
/// - `GET /api/invoices` - Invoice summaries, newest first
/// - `POST /api/invoices` - Save a new invoice
/// - `GET /api/invoices/{id}` - Load an invoice
/// - `PUT /api/invoices/{id}` - Overwrite an invoice
/// - `DELETE /api/invoices/{id}` - Delete an invoice
/// - `GET /api/invoices/{id}/report` - HTML report of a stored invoice
/// - `POST /api/report` - HTML report of an unsaved draft
/// - `POST /api/calculate` - Totals for a list of items
/// - `GET /api/editor` - Fresh editor state
/// - `POST /api/editor` - Apply an editor command
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Invoices
        .route(
            "/api/invoices",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route(
            "/api/invoices/{id}",
            get(handlers::get_invoice)
                .put(handlers::update_invoice)
                .delete(handlers::delete_invoice),
        )
        .route("/api/invoices/{id}/report", get(handlers::invoice_report))
        // Stateless helpers
        .route("/api/report", post(handlers::draft_report))
        .route("/api/calculate", post(handlers::calculate))
        .route(
            "/api/editor",
            get(handlers::new_editor).post(handlers::apply_command),
        )
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
