// crates/server/src/jobs/store.rs
//! Aggregate progress per live job.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use asset_progress_core::JobId;
use chrono::{DateTime, Utc};

use super::types::JobSnapshot;

struct JobEntry {
    progress: u8,
    started_at: DateTime<Utc>,
}

/// Job ID → current progress (0–100).
///
/// A single lock covers every job. Entries live from `init` until `remove`,
/// which the hub calls once the completion event has gone out.
pub struct ProgressStore {
    jobs: Mutex<HashMap<JobId, JobEntry>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.lock().unwrap_or_else(|e: PoisonError<_>| {
            tracing::error!("Mutex poisoned on progress store, recovering");
            e.into_inner()
        })
    }

    /// Start tracking `job_id` at 0%. Resets the entry if it already exists.
    pub fn init(&self, job_id: &str) {
        self.lock().insert(
            job_id.to_string(),
            JobEntry {
                progress: 0,
                started_at: Utc::now(),
            },
        );
    }

    /// Add `delta` to the job's progress, saturating at 100.
    ///
    /// Returns the new total, or `None` if the job is not tracked.
    pub fn increment(&self, job_id: &str, delta: u8) -> Option<u8> {
        let mut jobs = self.lock();
        let entry = jobs.get_mut(job_id)?;
        entry.progress = entry.progress.saturating_add(delta).min(100);
        Some(entry.progress)
    }

    /// Force the job to 100%, returning the value it had before.
    pub fn complete(&self, job_id: &str) -> Option<u8> {
        let mut jobs = self.lock();
        let entry = jobs.get_mut(job_id)?;
        let previous = entry.progress;
        entry.progress = 100;
        Some(previous)
    }

    pub fn get(&self, job_id: &str) -> Option<u8> {
        self.lock().get(job_id).map(|e| e.progress)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.lock().contains_key(job_id)
    }

    /// Stop tracking the job. Returns `true` if it was present.
    pub fn remove(&self, job_id: &str) -> bool {
        self.lock().remove(job_id).is_some()
    }

    pub fn snapshot(&self, job_id: &str) -> Option<JobSnapshot> {
        self.lock().get(job_id).map(|e| to_snapshot(job_id, e))
    }

    /// All live jobs, oldest first.
    pub fn snapshots(&self) -> Vec<JobSnapshot> {
        let jobs = self.lock();
        let mut entries: Vec<_> = jobs.iter().collect();
        entries.sort_by_key(|(_, e)| e.started_at);
        entries
            .into_iter()
            .map(|(id, e)| to_snapshot(id, e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_snapshot(job_id: &str, entry: &JobEntry) -> JobSnapshot {
    JobSnapshot {
        job_id: job_id.to_string(),
        progress: entry.progress,
        started_at: entry.started_at.to_rfc3339(),
    }
}
