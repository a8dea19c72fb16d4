//! In-flight request tracking
//!
//! Each fetch is keyed by the slice it writes. Starting a new request for a key
//! cancels the previous one: its future stops waiting on the network and it
//! dispatches nothing, so the slice always reflects the latest issued request
//! rather than the latest arrival.

use crate::store::SliceKind;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

struct InFlight {
    generation: u64,
    cancel: Arc<Notify>,
}

/// Handle for one issued request
pub struct Ticket {
    key: SliceKind,
    generation: u64,
    cancel: Arc<Notify>,
}

impl Ticket {
    pub fn key(&self) -> SliceKind {
        self.key
    }

    /// Drive `fut` until it finishes or a newer request for the same key starts
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.notified() => None,
            out = fut => Some(out),
        }
    }
}

/// Supersession registry keyed by target slice
#[derive(Default)]
pub struct RequestTracker {
    next_generation: AtomicU64,
    in_flight: Mutex<HashMap<SliceKind, InFlight>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request, cancelling any older one for the same key
    ///
    /// `on_start` runs under the registry lock, so the loading transition of
    /// a request is always ordered before the start and the completion of any
    /// newer request for the same key.
    pub fn begin(&self, key: SliceKind, on_start: impl FnOnce()) -> Ticket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = Arc::new(Notify::new());

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = in_flight.insert(
            key,
            InFlight {
                generation,
                cancel: cancel.clone(),
            },
        );
        on_start();
        drop(in_flight);

        if let Some(previous) = previous {
            tracing::debug!(
                "Request {} for {:?} supersedes {}",
                generation,
                key,
                previous.generation
            );
            // notify_one stores a permit if the older request is not polling yet
            previous.cancel.notify_one();
        }

        Ticket {
            key,
            generation,
            cancel,
        }
    }

    /// Whether `ticket` is still the newest request for its key
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ticket.key)
            .is_some_and(|entry| entry.generation == ticket.generation)
    }

    /// Run `apply` and retire the ticket if it is still current
    ///
    /// The check and the dispatch happen under the same lock as `begin`, so a
    /// stale completion cannot overwrite the loading state of a newer request.
    pub fn complete<R>(&self, ticket: &Ticket, apply: impl FnOnce() -> R) -> Option<R> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        match in_flight.get(&ticket.key) {
            Some(entry) if entry.generation == ticket.generation => {
                in_flight.remove(&ticket.key);
                Some(apply())
            }
            _ => None,
        }
    }

    /// Number of keys with a request outstanding
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_newer_request_cancels_older() {
        let tracker = RequestTracker::new();
        let (_tx, rx) = oneshot::channel::<u32>();

        let first = tracker.begin(SliceKind::Apps, || {});
        let second = tracker.begin(SliceKind::Apps, || {});

        // Cancellation was signalled before the first future was polled
        assert!(first.run(rx).await.is_none());
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert_eq!(second.run(async { 7 }).await, Some(7));
    }

    #[test]
    fn test_complete_only_applies_current() {
        let tracker = RequestTracker::new();
        let stale = tracker.begin(SliceKind::SelectedApp, || {});
        let fresh = tracker.begin(SliceKind::SelectedApp, || {});

        assert_eq!(tracker.complete(&stale, || "stale"), None);
        assert_eq!(tracker.complete(&fresh, || "fresh"), Some("fresh"));
        assert_eq!(tracker.in_flight(), 0);
        // Already retired
        assert_eq!(tracker.complete(&fresh, || "again"), None);
    }

    #[test]
    fn test_start_hook_runs_once_per_begin() {
        let tracker = RequestTracker::new();
        let mut started = Vec::new();
        let first = tracker.begin(SliceKind::Apps, || started.push(1));
        let second = tracker.begin(SliceKind::Apps, || started.push(2));

        assert_eq!(started, vec![1, 2]);
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
    }

    #[test]
    fn test_keys_do_not_interfere() {
        let tracker = RequestTracker::new();
        let created = tracker.begin(SliceKind::CreatedMemories, || {});
        let accessed = tracker.begin(SliceKind::AccessedMemories, || {});

        assert!(tracker.is_current(&created));
        assert!(tracker.is_current(&accessed));
        assert_eq!(tracker.in_flight(), 2);
        assert_eq!(created.key(), SliceKind::CreatedMemories);
    }
}
