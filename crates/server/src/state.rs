// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use asset_progress_core::Project;

use crate::config::ServerConfig;
use crate::jobs::{
    AssetWorker, BroadcastHub, JobOrchestrator, ProgressStore, SimulatedWorker, SubscriberRegistry,
};

/// Shared application state accessible from all route handlers.
///
/// Built once at startup; the store and registry inside are the only
/// instances for the process.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    pub config: ServerConfig,
    /// Project whose assets every new job generates.
    pub catalog: Project,
    pub store: Arc<ProgressStore>,
    pub registry: Arc<SubscriberRegistry>,
    pub hub: Arc<BroadcastHub>,
    pub orchestrator: JobOrchestrator,
}

impl AppState {
    /// Create state with the simulated asset worker.
    pub fn new(config: ServerConfig, catalog: Project) -> Arc<Self> {
        Self::with_worker(config, catalog, Arc::new(SimulatedWorker))
    }

    /// Create state with a caller-provided worker (for testing).
    pub fn with_worker(
        config: ServerConfig,
        catalog: Project,
        worker: Arc<dyn AssetWorker>,
    ) -> Arc<Self> {
        let store = Arc::new(ProgressStore::new());
        let registry = Arc::new(SubscriberRegistry::new());
        let hub = Arc::new(BroadcastHub::new(Arc::clone(&store), Arc::clone(&registry)));
        let orchestrator = JobOrchestrator::new(Arc::clone(&store), Arc::clone(&hub), worker)
            .with_task_timeout(config.subtask_timeout);

        Arc::new(Self {
            start_time: Instant::now(),
            config,
            catalog,
            store,
            registry,
            hub,
            orchestrator,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
