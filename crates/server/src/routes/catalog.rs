// crates/server/src/routes/catalog.rs
//! GET /api/catalog - the project and sub-tasks every new job generates.

use std::sync::Arc;

use asset_progress_core::Project;
use axum::{extract::State, routing::get, Json, Router};

use crate::state::AppState;

async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<Project> {
    Json(state.catalog.clone())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/catalog", get(get_catalog))
}
