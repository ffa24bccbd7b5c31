// crates/server/src/jobs/registry.rs
//! Live subscribers, grouped by the job they watch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use asset_progress_core::{JobId, ProgressEvent};
use tokio::sync::mpsc;

use super::types::SubscriberId;

/// Registry-side half of a subscriber connection.
///
/// Holds the only sender of the subscriber's channel, so dropping it closes
/// the channel.
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<ProgressEvent>,
    finished: Arc<AtomicBool>,
    connected_at: Instant,
}

impl Subscriber {
    pub fn new(id: SubscriberId, tx: mpsc::Sender<ProgressEvent>, finished: Arc<AtomicBool>) -> Self {
        Self {
            id,
            tx,
            finished,
            connected_at: Instant::now(),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Attempt one non-blocking delivery.
    pub(crate) fn try_deliver(
        &self,
        event: ProgressEvent,
    ) -> Result<(), mpsc::error::TrySendError<ProgressEvent>> {
        self.tx.try_send(event)
    }

    /// Flag that the job ended, so the receiving side can tell a completion
    /// close from a disconnect even if the terminal event was dropped.
    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

type SubscriberMap = HashMap<JobId, Vec<Subscriber>>;

/// Job ID → subscribers currently attached to it.
///
/// One lock guards the whole map. The broadcast hub iterates under the same
/// lock, so a delivery and an unregister can never touch the same channel
/// concurrently.
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Mutex<SubscriberMap>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubscriberMap> {
        self.subscribers.lock().unwrap_or_else(|e: PoisonError<_>| {
            tracing::error!("Mutex poisoned on subscriber registry, recovering");
            e.into_inner()
        })
    }

    /// Allocate a fresh subscriber identity.
    pub fn next_subscriber_id(&self) -> SubscriberId {
        SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Attach `subscriber` to `job_id`, creating the job's set if needed.
    pub fn register(&self, job_id: &str, subscriber: Subscriber) {
        let mut map = self.lock();
        insert(&mut map, job_id, subscriber);
    }

    /// Attach `subscriber` only if `is_live` holds, checked under the lock.
    ///
    /// Returns the subscriber back when the job is not live. Because the hub's
    /// `finish` retires jobs while holding this same lock, a subscriber can
    /// never be attached to a job whose completion has already gone out.
    pub fn register_if(
        &self,
        job_id: &str,
        subscriber: Subscriber,
        is_live: impl FnOnce() -> bool,
    ) -> Result<(), Subscriber> {
        let mut map = self.lock();
        if !is_live() {
            return Err(subscriber);
        }
        insert(&mut map, job_id, subscriber);
        Ok(())
    }

    /// Detach a subscriber and close its channel.
    ///
    /// Remove-if-present: a second call for the same subscriber finds nothing
    /// and returns `false`, so the channel is closed at most once.
    pub fn unregister(&self, job_id: &str, id: SubscriberId) -> bool {
        let mut map = self.lock();
        let Some(subs) = map.get_mut(job_id) else {
            return false;
        };
        let Some(pos) = subs.iter().position(|s| s.id == id) else {
            return false;
        };

        let removed = subs.remove(pos);
        if subs.is_empty() {
            map.remove(job_id);
        }
        drop(map);

        tracing::info!(
            job_id = %job_id,
            subscriber_id = %removed.id,
            connected_ms = removed.connected_at().elapsed().as_millis() as u64,
            "Subscriber disconnected"
        );
        drop(removed);
        true
    }

    /// Run `f` over the job's subscribers while holding the lock.
    pub(crate) fn with_subscribers<R>(&self, job_id: &str, f: impl FnOnce(&[Subscriber]) -> R) -> R {
        let map = self.lock();
        let subs = map.get(job_id).map(Vec::as_slice).unwrap_or(&[]);
        f(subs)
    }

    /// Detach every subscriber of `job_id` and hand them to `f`, still under
    /// the lock. Channels close when `f` drops the subscribers.
    pub(crate) fn close_job<R>(&self, job_id: &str, f: impl FnOnce(Vec<Subscriber>) -> R) -> R {
        let mut map = self.lock();
        let subs = map.remove(job_id).unwrap_or_default();
        f(subs)
    }

    pub fn subscriber_count(&self, job_id: &str) -> usize {
        self.lock().get(job_id).map_or(0, Vec::len)
    }

    /// Number of jobs with at least one subscriber.
    pub fn job_count(&self) -> usize {
        self.lock().len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn insert(map: &mut SubscriberMap, job_id: &str, subscriber: Subscriber) {
    let subs = map.entry(job_id.to_string()).or_default();
    if subs.iter().any(|s| s.id == subscriber.id) {
        tracing::warn!(job_id = %job_id, subscriber_id = %subscriber.id, "Subscriber already registered");
        return;
    }
    tracing::debug!(job_id = %job_id, subscriber_id = %subscriber.id, "Subscriber registered");
    subs.push(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(
        registry: &SubscriberRegistry,
    ) -> (Subscriber, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(4);
        let sub = Subscriber::new(
            registry.next_subscriber_id(),
            tx,
            Arc::new(AtomicBool::new(false)),
        );
        (sub, rx)
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = SubscriberRegistry::new();
        let (sub, _rx) = subscriber(&registry);
        let id = sub.id();

        registry.register("job", sub);
        assert_eq!(registry.subscriber_count("job"), 1);

        assert!(registry.unregister("job", id));
        assert_eq!(registry.subscriber_count("job"), 0);
        // Emptied sets are removed.
        assert_eq!(registry.job_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_subscriber_id_is_ignored() {
        let registry = SubscriberRegistry::new();
        let (first, _rx_first) = subscriber(&registry);
        let id = first.id();
        registry.register("job", first);

        let (tx, mut rx_dup) = mpsc::channel(4);
        let duplicate = Subscriber::new(id, tx, Arc::new(AtomicBool::new(false)));
        assert!(duplicate.connected_at() <= Instant::now());
        registry.register("job", duplicate);

        assert_eq!(registry.subscriber_count("job"), 1);
        // The rejected subscriber's sender was dropped.
        assert!(rx_dup.recv().await.is_none());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (sub, _rx) = subscriber(&registry);
        let id = sub.id();
        registry.register("job", sub);

        assert!(registry.unregister("job", id));
        assert!(!registry.unregister("job", id));
        assert!(!registry.unregister("other-job", id));
    }

    #[tokio::test]
    async fn test_unregister_closes_channel() {
        let registry = SubscriberRegistry::new();
        let (sub, mut rx) = subscriber(&registry);
        let id = sub.id();
        registry.register("job", sub);

        registry.unregister("job", id);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_unregister_keeps_other_subscribers() {
        let registry = SubscriberRegistry::new();
        let (a, _rx_a) = subscriber(&registry);
        let (b, _rx_b) = subscriber(&registry);
        let a_id = a.id();
        registry.register("job", a);
        registry.register("job", b);

        registry.unregister("job", a_id);
        assert_eq!(registry.subscriber_count("job"), 1);
        assert_eq!(registry.job_count(), 1);
    }

    #[test]
    fn test_register_if_rejects_dead_job() {
        let registry = SubscriberRegistry::new();
        let (sub, _rx) = subscriber(&registry);

        let result = registry.register_if("job", sub, || false);
        assert!(result.is_err());
        assert_eq!(registry.job_count(), 0);

        let (sub, _rx) = subscriber(&registry);
        assert!(registry.register_if("job", sub, || true).is_ok());
        assert_eq!(registry.subscriber_count("job"), 1);
    }

    #[test]
    fn test_subscriber_ids_are_unique() {
        let registry = SubscriberRegistry::new();
        let a = registry.next_subscriber_id();
        let b = registry.next_subscriber_id();
        assert_ne!(a, b);
    }
}
