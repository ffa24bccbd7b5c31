// crates/server/src/jobs/orchestrator.rs
//! Runs a job's sub-tasks concurrently and turns their completions into
//! progress broadcasts.

use std::sync::Arc;
use std::time::Duration;

use asset_progress_core::{JobId, Progress, Project, SubTask};
use tokio::task::{JoinHandle, JoinSet};

use super::hub::BroadcastHub;
use super::store::ProgressStore;
use super::types::Job;
use super::worker::{AssetWorker, WorkError};

/// Handle to a started job.
pub struct JobHandle {
    pub id: JobId,
    task: JoinHandle<()>,
}

impl JobHandle {
    /// Wait until the job has broadcast its completion.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!(job_id = %self.id, error = %e, "Job supervisor task failed");
        }
    }
}

struct UnitOutcome {
    name: String,
    weight: u8,
    result: Result<(), WorkError>,
}

/// Drives jobs from start to completion.
///
/// Cheap to clone; every clone shares the same store, hub and worker.
#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<ProgressStore>,
    hub: Arc<BroadcastHub>,
    worker: Arc<dyn AssetWorker>,
    task_timeout: Option<Duration>,
}

impl JobOrchestrator {
    pub fn new(store: Arc<ProgressStore>, hub: Arc<BroadcastHub>, worker: Arc<dyn AssetWorker>) -> Self {
        Self {
            store,
            hub,
            worker,
            task_timeout: None,
        }
    }

    /// Bound each sub-task's run time. `None` waits indefinitely.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Start generating every asset of `project` under a fresh job ID.
    ///
    /// Progress is seeded at 0 before this returns, so the ID can be
    /// subscribed to immediately. Weights that do not sum to 100 are logged;
    /// the job still ends at 100 because completion force-sets it.
    pub fn start_job(&self, project: &Project) -> JobHandle {
        if let Err(e) = project.validate() {
            tracing::warn!(project_id = %project.id, error = %e, "Starting job with unbalanced catalog entry");
        }

        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            tasks: project.tasks.clone(),
        };
        let id = job.id.clone();
        self.store.init(&id);
        tracing::info!(
            job_id = %id,
            project_id = %job.project_id,
            tasks = job.tasks.len(),
            "Started job"
        );

        let this = self.clone();
        let task = tokio::spawn(async move { this.run_job(job).await });
        JobHandle { id, task }
    }

    /// Run all sub-tasks of `job`, then broadcast completion.
    ///
    /// Sub-tasks run in parallel and may finish in any order. Their
    /// increments and broadcasts happen here, one at a time, so subscribers
    /// see a non-decreasing sequence. The completion event is always the last
    /// broadcast for the job.
    pub async fn run_job(&self, job: Job) {
        let mut units = JoinSet::new();
        for task in job.tasks {
            let worker = Arc::clone(&self.worker);
            let timeout = self.task_timeout;
            units.spawn(async move { run_unit(worker.as_ref(), task, timeout).await });
        }

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(UnitOutcome {
                    name,
                    weight,
                    result: Ok(()),
                }) => self.record_progress(&job.id, &name, weight),
                Ok(UnitOutcome {
                    name,
                    result: Err(e),
                    ..
                }) => {
                    tracing::warn!(job_id = %job.id, task = %name, error = %e, "Sub-task contributed no progress");
                }
                Err(e) => {
                    tracing::error!(job_id = %job.id, error = %e, "Sub-task panicked");
                }
            }
        }

        match self.store.complete(&job.id) {
            Some(previous) if previous < 100 => {
                self.hub.broadcast(&job.id, Progress::Percent(100));
            }
            Some(_) => {}
            None => tracing::warn!(job_id = %job.id, "Job vanished from store before completion"),
        }
        self.hub.finish(&job.id);
        tracing::info!(job_id = %job.id, "Job generation completed");
    }

    fn record_progress(&self, job_id: &str, task: &str, weight: u8) {
        let previous = self.store.get(job_id).unwrap_or(0);
        let Some(total) = self.store.increment(job_id, weight) else {
            tracing::warn!(job_id = %job_id, task = %task, "Progress update for unknown job");
            return;
        };
        if (previous < 50 && total >= 50) || total == 100 {
            tracing::info!(job_id = %job_id, progress = total, "Job progress milestone");
        }
        let outcome = self.hub.broadcast(job_id, Progress::Percent(total));
        tracing::debug!(
            job_id = %job_id,
            task = %task,
            progress = total,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "Sub-task finished"
        );
    }
}

async fn run_unit(worker: &dyn AssetWorker, task: SubTask, timeout: Option<Duration>) -> UnitOutcome {
    let result = match timeout {
        Some(after) => match tokio::time::timeout(after, worker.generate(&task)).await {
            Ok(result) => result,
            Err(_) => Err(WorkError::TimedOut {
                name: task.name.clone(),
                after,
            }),
        },
        None => worker.generate(&task).await,
    };
    UnitOutcome {
        name: task.name,
        weight: task.weight,
        result,
    }
}
