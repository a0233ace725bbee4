// Reportforge - AI research report generator with a parallel section-writing workflow

pub mod config;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod pdf;
pub mod report;    // Core workflow: plan, research fan-out, synthesis, compile
pub mod routes;
pub mod search;    // Tavily search client and result aggregation
pub mod storage;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use report::{generate_report, WorkflowOptions};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
