//! Saved-Report Endpoints
//!
//! List, fetch, delete, and export previously stored reports. All access
//! is scoped to the authenticated user's folder in the report store.

use crate::middleware::AuthUser;
use crate::models::AppState;
use crate::pdf::markdown_to_pdf;
use crate::storage::{ReportStore, SavedReport};
use crate::types::{AppError, AppResult};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/reports/saved", get(list_reports))
        .route(
            "/api/reports/saved/{filename}",
            get(get_report).delete(delete_report),
        )
        .route("/api/reports/saved/{filename}/pdf", get(download_pdf))
        .with_state(state)
}

fn store(state: &AppState) -> AppResult<Arc<ReportStore>> {
    state
        .store
        .clone()
        .ok_or_else(|| AppError::Storage("report store is not configured".to_string()))
}

async fn list_reports(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<SavedReport>>> {
    let reports = store(&state)?.list(&user.0).await?;
    Ok(Json(reports))
}

async fn get_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(filename): Path<String>,
) -> AppResult<String> {
    store(&state)?.get(&user.0, &filename).await
}

async fn delete_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(filename): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = store(&state)?.delete(&user.0, &filename).await?;
    info!(user = %user.0, filename = %filename, "deleted saved report");
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

async fn download_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let content = store(&state)?.get(&user.0, &filename).await?;
    let title = filename.trim_end_matches(".md").replace('_', " ");
    let pdf = markdown_to_pdf(&content, &title)?;

    let download_name = format!("{}.pdf", filename.trim_end_matches(".md"));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
        ],
        pdf,
    ))
}
