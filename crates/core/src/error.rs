// crates/core/src/error.rs
use thiserror::Error;

/// Errors that can occur when validating a catalog project
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Project {project_id} has no sub-tasks")]
    NoTasks { project_id: String },

    #[error("Sub-task weights for project {project_id} sum to {total}, expected 100")]
    WeightSum { project_id: String, total: u32 },
}
