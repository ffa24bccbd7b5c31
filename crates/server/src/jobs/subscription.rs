// crates/server/src/jobs/subscription.rs
//! Lifecycle of one subscriber connection.
//!
//! A [`Subscription`] is registered on open and relays events until either
//! the job finishes (the hub closes the channel) or the subscription is
//! dropped (the client went away). Dropping cancels a token watched by a
//! background task, which unregisters the subscriber. Whichever path runs
//! first closes the channel; the other finds nothing to do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use asset_progress_core::{JobId, ProgressEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::registry::{Subscriber, SubscriberRegistry};
use super::store::ProgressStore;
use super::types::SubscriberId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("Job ID is required")]
    MissingJobId,

    #[error("Job not found: {0}")]
    JobNotFound(JobId),
}

pub struct Subscription {
    job_id: JobId,
    id: SubscriberId,
    rx: mpsc::Receiver<ProgressEvent>,
    finished: Arc<AtomicBool>,
    done: bool,
    _disconnect: DropGuard,
}

impl Subscription {
    /// Register a new subscriber for `job_id` with room for `capacity`
    /// undelivered events.
    ///
    /// Fails if the ID is blank or the job is not live (never started, or
    /// already completed).
    pub fn open(
        registry: &Arc<SubscriberRegistry>,
        store: &ProgressStore,
        job_id: &str,
        capacity: usize,
    ) -> Result<Self, SubscribeError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(SubscribeError::MissingJobId);
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let finished = Arc::new(AtomicBool::new(false));
        let id = registry.next_subscriber_id();
        let subscriber = Subscriber::new(id, tx, Arc::clone(&finished));

        if registry
            .register_if(job_id, subscriber, || store.contains(job_id))
            .is_err()
        {
            return Err(SubscribeError::JobNotFound(job_id.to_string()));
        }

        let token = CancellationToken::new();
        let watcher = token.clone();
        let watched_registry = Arc::clone(registry);
        let watched_job = job_id.to_string();
        tokio::spawn(async move {
            watcher.cancelled().await;
            watched_registry.unregister(&watched_job, id);
        });

        tracing::info!(job_id = %job_id, subscriber_id = %id, "Subscriber connected");

        Ok(Self {
            job_id: job_id.to_string(),
            id,
            rx,
            finished,
            done: false,
            _disconnect: token.drop_guard(),
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event for this subscriber, or `None` once the relay is over.
    ///
    /// The terminal event is always the last item. If the job finished while
    /// this subscriber's channel was full, the dropped terminal event is
    /// produced here instead.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        if self.done {
            return None;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.done = event.is_terminal();
                Some(event)
            }
            None => {
                self.done = true;
                self.finished
                    .load(Ordering::Acquire)
                    .then(|| ProgressEvent::completed(self.job_id.as_str()))
            }
        }
    }

    /// Relay events as a stream. Dropping the stream unregisters the
    /// subscriber.
    pub fn into_stream(mut self) -> impl Stream<Item = ProgressEvent> + Send {
        async_stream::stream! {
            while let Some(event) = self.next_event().await {
                yield event;
            }
        }
    }
}
