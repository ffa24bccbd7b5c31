// crates/server/src/jobs/worker.rs
//! The unit of work behind each sub-task.

use std::time::Duration;

use asset_progress_core::{FileType, SubTask};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("No generator for file type {0:?}")]
    UnsupportedFileType(FileType),

    #[error("Generation of {name} failed: {message}")]
    Failed { name: String, message: String },

    #[error("Generation of {name} timed out after {after:?}")]
    TimedOut { name: String, after: Duration },
}

/// Produces one asset. Implementations must be safe to call concurrently.
#[async_trait]
pub trait AssetWorker: Send + Sync {
    async fn generate(&self, task: &SubTask) -> Result<(), WorkError>;
}

/// Stand-in generator that waits for the task's simulated duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedWorker;

#[async_trait]
impl AssetWorker for SimulatedWorker {
    async fn generate(&self, task: &SubTask) -> Result<(), WorkError> {
        if !task.file_type.is_known() {
            return Err(WorkError::UnsupportedFileType(task.file_type.clone()));
        }
        tokio::time::sleep(task.duration()).await;
        Ok(())
    }
}
