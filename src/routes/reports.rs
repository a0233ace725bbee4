//! Report Run Endpoints
//!
//! Starting a report kicks the workflow onto its own tokio task and
//! returns a run id immediately; the multi-minute run never blocks the
//! request. Clients poll the status endpoint for the current stage and,
//! once completed, the document itself.

use crate::middleware::AuthUser;
use crate::models::{AppState, GenerateReportRequest, GenerateReportResponse, RunStatus};
use crate::report::{generate_report, WorkflowOptions};
use crate::types::{AppError, AppResult};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/reports", post(start_report))
        .route("/api/reports/{run_id}", get(run_status))
        .with_state(state)
}

async fn start_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<GenerateReportRequest>,
) -> AppResult<Json<GenerateReportResponse>> {
    let topic = request.topic.trim().to_string();
    if topic.is_empty() {
        return Err(AppError::InvalidRequest(
            "topic must not be empty".to_string(),
        ));
    }

    info!(user = %user.0, topic = %topic, "starting report run");
    let run_id = state.runs.create(&user.0, &topic).await;

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let runs = state.runs.clone();
    tokio::spawn(async move {
        while let Some(stage) = progress_rx.recv().await {
            runs.set_stage(run_id, stage).await;
        }
    });

    let runs = state.runs.clone();
    let factory = state.factory.clone();
    let store = state.store.clone();
    let recursion_limit = state.config.report.recursion_limit;
    let user_id = user.0.clone();
    tokio::spawn(async move {
        let options = WorkflowOptions {
            recursion_limit,
            progress: Some(progress_tx),
        };
        match generate_report(&topic, factory, options).await {
            Ok(report) => {
                if request.save {
                    match &store {
                        Some(store) => {
                            if let Err(e) = store.save(&user_id, &topic, &report).await {
                                warn!(error = %e, "report finished but could not be saved");
                            }
                        }
                        None => warn!("save requested but no report store is configured"),
                    }
                }
                runs.complete(run_id, report).await;
            }
            Err(e) => {
                error!(error = %e, "report run failed");
                runs.fail(run_id, e.to_string()).await;
            }
        }
    });

    Ok(Json(GenerateReportResponse {
        run_id,
        status: RunStatus::Pending,
    }))
}

async fn run_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(run_id): Path<Uuid>,
) -> AppResult<Json<crate::models::ReportRun>> {
    let run = state
        .runs
        .get(run_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("run {}", run_id)))?;

    if run.user_id != user.0 {
        return Err(AppError::NotFound(format!("run {}", run_id)));
    }

    Ok(Json(run))
}
