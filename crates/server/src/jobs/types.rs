// crates/server/src/jobs/types.rs
//! Types shared by the progress broadcast core.

use std::fmt;

use asset_progress_core::{JobId, SubTask};
use serde::Serialize;

/// Process-unique identity of one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A job ready to run: its identity plus the sub-tasks it aggregates.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub project_id: String,
    pub tasks: Vec<SubTask>,
}

/// Point-in-time view of a live job, served by the polling endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    pub progress: u8,
    pub started_at: String,
}

/// Result of one fan-out attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Subscribers whose channel accepted the event.
    pub delivered: usize,
    /// Subscribers skipped because their channel was full or already closed.
    pub dropped: usize,
}
