// crates/server/src/lib.rs
//! Asset progress server library.
//!
//! Runs simulated accessibility-asset generation jobs and streams each job's
//! progress to any number of browser clients over Server-Sent Events.

pub mod config;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// Browsers open the progress stream from another origin, so CORS allows
/// any origin.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
