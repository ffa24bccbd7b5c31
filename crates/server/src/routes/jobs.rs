// crates/server/src/routes/jobs.rs
//! API routes for starting and inspecting generation jobs.
//!
//! - POST /jobs - Start generating the catalog project's assets
//! - GET /jobs - List live jobs
//! - GET /jobs/{job_id} - Snapshot of one live job

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::jobs::JobSnapshot;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StartJobResponse {
    #[serde(rename = "jobID")]
    pub job_id: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
}

/// POST /api/jobs - Start a job and return its ID.
async fn start_job(State(state): State<Arc<AppState>>) -> Json<StartJobResponse> {
    let handle = state.orchestrator.start_job(&state.catalog);
    Json(StartJobResponse {
        job_id: handle.id,
        project_id: state.catalog.id.clone(),
    })
}

/// GET /api/jobs - List live jobs.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobSnapshot>> {
    Json(state.store.snapshots())
}

/// GET /api/jobs/{job_id} - Current progress of one live job.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    state
        .store
        .snapshot(&job_id)
        .map(Json)
        .ok_or(ApiError::JobNotFound(job_id))
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs).post(start_job))
        .route("/jobs/{job_id}", get(get_job))
}
