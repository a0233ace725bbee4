//! Static File Serving
//!
//! Serves the single-page frontend from the `static/` directory.

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

/// Create router for serving static files. Unknown paths fall back to the
/// index page for client-side routing.
pub fn router() -> Router {
    let serve_dir =
        ServeDir::new("static").not_found_service(ServeFile::new("static/index.html"));

    Router::new().fallback_service(serve_dir)
}
