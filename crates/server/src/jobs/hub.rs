// crates/server/src/jobs/hub.rs
//! Best-effort fan-out of progress events.
//!
//! Each subscriber gets exactly one `try_send` per event. A full channel drops
//! the event; since events carry absolute progress, the next delivered event
//! brings the consumer back in sync. Producers never wait on consumers.

use std::sync::Arc;

use asset_progress_core::{Progress, ProgressEvent};
use tokio::sync::mpsc::error::TrySendError;

use super::registry::{Subscriber, SubscriberRegistry};
use super::store::ProgressStore;
use super::types::BroadcastOutcome;

pub struct BroadcastHub {
    store: Arc<ProgressStore>,
    registry: Arc<SubscriberRegistry>,
}

impl BroadcastHub {
    pub fn new(store: Arc<ProgressStore>, registry: Arc<SubscriberRegistry>) -> Self {
        Self { store, registry }
    }

    /// Deliver `progress` for `job_id` to every current subscriber.
    pub fn broadcast(&self, job_id: &str, progress: Progress) -> BroadcastOutcome {
        let event = ProgressEvent {
            job_id: job_id.to_string(),
            progress,
        };
        self.registry.with_subscribers(job_id, |subs| {
            let mut outcome = BroadcastOutcome::default();
            for sub in subs {
                if deliver(job_id, sub, &event) {
                    outcome.delivered += 1;
                } else {
                    outcome.dropped += 1;
                }
            }
            outcome
        })
    }

    /// Send the terminal event, close every subscriber channel for the job and
    /// retire it from the store, all under the registry lock.
    ///
    /// Nothing can be broadcast to or registered for `job_id` afterwards.
    pub fn finish(&self, job_id: &str) -> BroadcastOutcome {
        let event = ProgressEvent::completed(job_id);
        let outcome = self.registry.close_job(job_id, |subs| {
            let mut outcome = BroadcastOutcome::default();
            for sub in subs {
                sub.mark_finished();
                if deliver(job_id, &sub, &event) {
                    outcome.delivered += 1;
                } else {
                    outcome.dropped += 1;
                }
                // Dropping `sub` closes its channel.
            }
            self.store.remove(job_id);
            outcome
        });
        tracing::info!(
            job_id = %job_id,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "Job completion broadcast"
        );
        outcome
    }
}

fn deliver(job_id: &str, sub: &Subscriber, event: &ProgressEvent) -> bool {
    match sub.try_deliver(event.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::debug!(
                job_id = %job_id,
                subscriber_id = %sub.id(),
                "Subscriber channel full, dropping progress event"
            );
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(
                job_id = %job_id,
                subscriber_id = %sub.id(),
                "Subscriber channel closed, skipping"
            );
            false
        }
    }
}
