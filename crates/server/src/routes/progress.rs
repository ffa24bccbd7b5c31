// crates/server/src/routes/progress.rs
//! Live job progress over Server-Sent Events.
//!
//! `GET /api/progress?jobID=<id>` streams `data: {"jobID":..,"progress":..}`
//! events until the job completes (`"progress":"completed"`) or the client
//! disconnects.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{Extensions, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt};

use crate::error::{ApiError, ApiResult};
use crate::jobs::Subscription;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    #[serde(default, rename = "jobID", alias = "assetID")]
    pub job_id: Option<String>,
}

/// Build the progress sub-router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/progress", get(stream_progress))
}

/// GET /api/progress - SSE stream of one job's progress.
///
/// A missing or malformed job ID is a 400 and an unknown or finished job a
/// 404; in both cases no stream is opened.
pub async fn stream_progress(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
    headers: HeaderMap,
    extensions: Extensions,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let job_id = query.job_id.unwrap_or_default();
    let subscription = Subscription::open(
        &state.registry,
        &state.store,
        &job_id,
        state.config.channel_capacity,
    )?;

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info!(
        job_id = %subscription.job_id(),
        subscriber_id = %subscription.id(),
        client = %client_addr(&extensions),
        user_agent = %user_agent,
        "Progress stream opened"
    );

    let stream = subscription.into_stream().filter_map(|event| {
        match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(e) => {
                tracing::warn!(job_id = %event.job_id, error = %e, "Failed to encode progress event");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.keep_alive)))
}

/// Peer address when the server was started with connect info.
fn client_addr(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string())
}
