//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/reports` - Start a report run / poll its progress
//! - `/api/reports/saved` - Saved-report management and PDF download
//! - `/api/health` - Health checks
//! - `/` - Static file serving (frontend)

pub mod health;
pub mod reports;
pub mod saved;
pub mod static_files;

use crate::middleware::auth_middleware;
use crate::models::AppState;
use crate::types::AppError;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
///
/// API routes are prefixed with `/api/` and run behind the auth layer;
/// static files are served from root `/` with an SPA fallback.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let api_router = Router::new()
        .merge(reports::router(state.clone()))
        .merge(saved::router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .merge(health::router());

    Router::new()
        .merge(api_router)
        .merge(static_files::router())
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Provider(_)
            | AppError::SchemaValidation(_)
            | AppError::MissingSection(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
