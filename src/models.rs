use crate::config::Config;
use crate::report::{ClientFactory, WorkflowStage};
use crate::storage::ReportStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub factory: Arc<dyn ClientFactory>,
    /// Absent when object storage is not configured; saved-report routes
    /// then refuse with a storage error.
    pub store: Option<Arc<ReportStore>>,
    pub runs: RunRegistry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One report-generation run, tracked while the workflow executes on its
/// own task. Callers poll this instead of blocking on the multi-minute run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportRun {
    pub id: Uuid,
    pub user_id: String,
    pub topic: String,
    pub status: RunStatus,
    /// Human-readable current workflow stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// In-memory registry of runs, shared between HTTP handlers and the
/// background workflow tasks.
#[derive(Clone, Default)]
pub struct RunRegistry {
    inner: Arc<RwLock<HashMap<Uuid, ReportRun>>>,
}

impl RunRegistry {
    pub async fn create(&self, user_id: &str, topic: &str) -> Uuid {
        let id = Uuid::new_v4();
        let run = ReportRun {
            id,
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            status: RunStatus::Pending,
            stage: None,
            report: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        self.inner.write().await.insert(id, run);
        id
    }

    pub async fn set_stage(&self, id: Uuid, stage: WorkflowStage) {
        if let Some(run) = self.inner.write().await.get_mut(&id) {
            run.status = RunStatus::Running;
            run.stage = Some(stage.to_string());
        }
    }

    pub async fn complete(&self, id: Uuid, report: String) {
        if let Some(run) = self.inner.write().await.get_mut(&id) {
            run.status = RunStatus::Completed;
            run.stage = Some(WorkflowStage::Done.to_string());
            run.report = Some(report);
            run.finished_at = Some(Utc::now());
        }
    }

    pub async fn fail(&self, id: Uuid, error: String) {
        if let Some(run) = self.inner.write().await.get_mut(&id) {
            run.status = RunStatus::Failed;
            run.error = Some(error);
            run.finished_at = Some(Utc::now());
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<ReportRun> {
        self.inner.read().await.get(&id).cloned()
    }
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct GenerateReportRequest {
    pub topic: String,
    /// Persist the finished report to the configured store.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct GenerateReportResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}
