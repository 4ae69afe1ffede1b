//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use offerte_core::service::SaveOutcome;
use offerte_core::{
    calculate_section_totals, CalculationResult, Command, EditError, EditorState, Invoice,
    InvoiceDraft, InvoiceService, InvoiceSummary, LineItem, RenderError, StoreError,
};

use super::routes::AppState;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// 404 with `{"error": ...}`.
    NotFound(String),
    /// 409 with `{"warning": ...}`; the editor state is unchanged.
    Refused(String),
    /// 500 with `{"error": ...}`.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Refused(message) => {
                (StatusCode::CONFLICT, Json(json!({ "warning": message }))).into_response()
            }
            ApiError::Internal(message) => {
                error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<EditError> for ApiError {
    fn from(e: EditError) -> Self {
        ApiError::Refused(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Run a store operation on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&InvoiceService) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    Ok(tokio::task::spawn_blocking(move || f(&service)).await??)
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InvoiceSummary>>, ApiError> {
    let list = run_blocking(&state, |service| service.list()).await?;
    Ok(Json(list))
}

/// POST /api/invoices
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<(StatusCode, Json<SaveOutcome>), ApiError> {
    let outcome = run_blocking(&state, move |service| service.create(draft)).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/invoices/{id}
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = run_blocking(&state, move |service| service.require(&id)).await?;
    Ok(Json(invoice))
}

/// PUT /api/invoices/{id}
pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<Json<SaveOutcome>, ApiError> {
    let outcome = run_blocking(&state, move |service| service.update(&id, draft)).await?;
    Ok(Json(outcome))
}

/// DELETE /api/invoices/{id}
pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    run_blocking(&state, move |service| service.delete(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/invoices/{id}/report
pub async fn invoice_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let invoice = run_blocking(&state, move |service| service.require(&id)).await?;
    let draft = invoice.to_draft();
    let html = state
        .renderer
        .render(&draft.project_details, &draft.calculated_sections())?;
    Ok(Html(html))
}

/// POST /api/report
pub async fn draft_report(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<Html<String>, ApiError> {
    let html = state
        .renderer
        .render(&draft.project_details, &draft.calculated_sections())?;
    Ok(Html(html))
}

/// Items to calculate.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// POST /api/calculate
pub async fn calculate(Json(request): Json<CalculateRequest>) -> Json<CalculationResult> {
    Json(calculate_section_totals(&request.items))
}

/// GET /api/editor
pub async fn new_editor() -> Json<EditorState> {
    Json(EditorState::default())
}

/// A command against an editor state.
#[derive(Debug, Deserialize)]
pub struct EditorRequest {
    #[serde(default)]
    pub state: EditorState,
    pub command: Command,
}

/// POST /api/editor
pub async fn apply_command(Json(request): Json<EditorRequest>) -> Result<Json<EditorState>, ApiError> {
    let next = request.state.apply(&request.command).inspect_err(|e| {
        warn!("Editor command refused: {}", e);
    })?;
    Ok(Json(next))
}
