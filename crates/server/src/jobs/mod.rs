// crates/server/src/jobs/mod.rs
//! Progress broadcast core for asset-generation jobs.
//!
//! Provides:
//! - `ProgressStore` - aggregate percentage per live job
//! - `SubscriberRegistry` - subscribers grouped by job, behind one lock
//! - `BroadcastHub` - non-blocking fan-out over the registry
//! - `JobOrchestrator` - runs weighted sub-tasks concurrently
//! - `Subscription` - one subscriber's relay, from open to disconnect

pub mod hub;
pub mod orchestrator;
pub mod registry;
pub mod store;
pub mod subscription;
pub mod types;
pub mod worker;

pub use hub::BroadcastHub;
pub use orchestrator::{JobHandle, JobOrchestrator};
pub use registry::{Subscriber, SubscriberRegistry};
pub use store::ProgressStore;
pub use subscription::{SubscribeError, Subscription};
pub use types::{BroadcastOutcome, Job, JobSnapshot, SubscriberId};
pub use worker::{AssetWorker, SimulatedWorker, WorkError};
