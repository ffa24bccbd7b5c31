//! API route handlers for the asset progress server.

pub mod catalog;
pub mod health;
pub mod jobs;
pub mod progress;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - GET  /api/catalog - Project and sub-tasks generated per job
/// - POST /api/jobs - Start a generation job
/// - GET  /api/jobs - List live jobs
/// - GET  /api/jobs/{job_id} - Progress snapshot of one job
/// - GET  /api/progress?jobID= - SSE stream of one job's progress
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", catalog::router())
        .nest("/api", jobs::router())
        .nest("/api", progress::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use asset_progress_core::default_project;

    #[tokio::test]
    async fn test_api_routes_creation() {
        let state = AppState::new(ServerConfig::default(), default_project());
        let _router = api_routes(state);
    }
}
