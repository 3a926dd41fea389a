use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::record::LastModifiedRecord;
use super::staleness::should_notify;
use crate::clock::Clock;

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The record was accepted and is now the stored state.
    Published { external_change: bool },
    /// A newer fetch superseded this one; the record was discarded.
    Stale,
}

/// Refresh state machine for one tracked piece of metadata.
///
/// Triggers (editor focus, save, poll timer) pass through a minimum-interval
/// gate: a trigger inside the window is deferred and released exactly once by
/// [`poll_deferred`] when the window elapses, never dropped. Every fetch that
/// fires carries a generation; a completion whose generation is no longer the
/// latest is discarded, so out-of-order responses cannot overwrite newer
/// state.
///
/// [`poll_deferred`]: ProvenanceTracker::poll_deferred
pub struct ProvenanceTracker<C: Clock> {
    clock: C,
    min_interval: Duration,
    last_fired: Option<DateTime<Utc>>,
    deferred: bool,
    fetching: bool,
    generation: u64,
    stored: Option<LastModifiedRecord>,
}

impl<C: Clock> ProvenanceTracker<C> {
    pub fn new(clock: C, min_interval: Duration, stored: Option<LastModifiedRecord>) -> Self {
        Self {
            clock,
            min_interval,
            last_fired: None,
            deferred: false,
            fetching: false,
            generation: 0,
            stored,
        }
    }

    /// Handle a refresh trigger. Returns the generation of the fetch to start
    /// now, or None when the trigger landed inside the debounce window and
    /// was deferred.
    pub fn on_trigger(&mut self) -> Option<u64> {
        let now = self.clock.now();

        if let Some(last) = self.last_fired {
            if now - last < self.min_interval {
                self.deferred = true;
                return None;
            }
        }

        Some(self.fire(now))
    }

    /// Release a deferred trigger whose window has elapsed. Returns the
    /// generation to fetch, or None when nothing is due.
    pub fn poll_deferred(&mut self) -> Option<u64> {
        if !self.deferred {
            return None;
        }

        let now = self.clock.now();
        match self.last_fired {
            Some(last) if now - last < self.min_interval => None,
            _ => Some(self.fire(now)),
        }
    }

    /// When the currently deferred trigger becomes due, if any.
    pub fn deferred_ready_at(&self) -> Option<DateTime<Utc>> {
        if !self.deferred {
            return None;
        }
        self.last_fired.map(|last| last + self.min_interval)
    }

    fn fire(&mut self, now: DateTime<Utc>) -> u64 {
        self.last_fired = Some(now);
        self.deferred = false;
        self.fetching = true;
        self.generation += 1;
        self.generation
    }

    /// Publish a fetched record, unless a newer fetch has fired since.
    pub fn on_success(&mut self, generation: u64, fresh: LastModifiedRecord) -> Completion {
        if generation != self.generation {
            debug!(
                "discarding stale fetch result (generation {generation}, current {})",
                self.generation
            );
            return Completion::Stale;
        }

        self.fetching = false;
        let external_change = should_notify(self.stored.as_ref(), &fresh);
        self.stored = Some(fresh);

        Completion::Published { external_change }
    }

    /// A fetch failed. The stored record is left untouched.
    pub fn on_failure(&mut self, generation: u64) {
        if generation == self.generation {
            self.fetching = false;
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn stored(&self) -> Option<&LastModifiedRecord> {
        self.stored.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct ManualClock {
        seconds: Arc<AtomicI64>,
    }

    impl ManualClock {
        fn advance(&self, seconds: i64) {
            self.seconds.fetch_add(seconds, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(self.seconds.load(Ordering::SeqCst), 0)
                .unwrap()
        }
    }

    fn record(seconds: i64, by_id: &str) -> LastModifiedRecord {
        let date = Utc.timestamp_opt(seconds, 0).unwrap();
        LastModifiedRecord {
            last_modified_by: "Someone".to_string(),
            last_modified_date: date,
            last_modified_by_id: by_id.to_string(),
            retrieved_at: date,
        }
    }

    fn tracker(clock: &ManualClock) -> ProvenanceTracker<ManualClock> {
        ProvenanceTracker::new(clock.clone(), Duration::seconds(5), None)
    }

    #[test]
    fn first_trigger_fires_immediately() {
        let clock = ManualClock::default();
        let mut tracker = tracker(&clock);

        assert_eq!(tracker.on_trigger(), Some(1));
        assert!(tracker.is_fetching());
    }

    #[test]
    fn triggers_inside_the_window_are_deferred_and_released_once() {
        let clock = ManualClock::default();
        let mut tracker = tracker(&clock);

        assert_eq!(tracker.on_trigger(), Some(1));

        // A burst of triggers inside the window defers without firing.
        clock.advance(1);
        assert_eq!(tracker.on_trigger(), None);
        assert_eq!(tracker.on_trigger(), None);
        assert_eq!(tracker.poll_deferred(), None);

        // Once the window elapses the deferred trigger fires exactly once.
        clock.advance(5);
        assert_eq!(tracker.poll_deferred(), Some(2));
        assert_eq!(tracker.poll_deferred(), None);
    }

    #[test]
    fn deferred_ready_at_reports_the_window_end() {
        let clock = ManualClock::default();
        let mut tracker = tracker(&clock);

        tracker.on_trigger();
        assert_eq!(tracker.deferred_ready_at(), None);

        clock.advance(2);
        tracker.on_trigger();
        assert_eq!(
            tracker.deferred_ready_at(),
            Some(Utc.timestamp_opt(5, 0).unwrap())
        );
    }

    #[test]
    fn stale_generation_cannot_overwrite_newer_state() {
        let clock = ManualClock::default();
        let mut tracker = tracker(&clock);

        let first = tracker.on_trigger().unwrap();
        clock.advance(10);
        let second = tracker.on_trigger().unwrap();

        // The newer fetch lands first.
        let fresh = record(100, "005B");
        assert_eq!(
            tracker.on_success(second, fresh.clone()),
            Completion::Published { external_change: false }
        );

        // The older response arrives late and is dropped.
        assert_eq!(tracker.on_success(first, record(50, "005C")), Completion::Stale);
        assert_eq!(tracker.stored(), Some(&fresh));
    }

    #[test]
    fn external_change_is_detected_against_the_stored_record() {
        let clock = ManualClock::default();
        let mut tracker =
            ProvenanceTracker::new(clock.clone(), Duration::seconds(5), Some(record(100, "005A")));

        let generation = tracker.on_trigger().unwrap();
        assert_eq!(
            tracker.on_success(generation, record(200, "005B")),
            Completion::Published { external_change: true }
        );
    }

    #[test]
    fn failure_returns_to_idle_and_keeps_the_stored_record() {
        let clock = ManualClock::default();
        let stored = record(100, "005A");
        let mut tracker =
            ProvenanceTracker::new(clock.clone(), Duration::seconds(5), Some(stored.clone()));

        let generation = tracker.on_trigger().unwrap();
        tracker.on_failure(generation);

        assert!(!tracker.is_fetching());
        assert_eq!(tracker.stored(), Some(&stored));
    }
}
