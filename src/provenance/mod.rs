mod record;
mod staleness;
mod store;
mod tracker;

pub use record::{LastModifiedRecord, RemoteModification};
pub use staleness::should_notify;
pub use store::RecordStore;
pub use tracker::{Completion, ProvenanceTracker};

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::MetadataApi;
use crate::clock::Clock;
use crate::error::Error;
use crate::metadata::{MetadataInfo, MetadataType};

/// Result of driving one refresh for a tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Trigger landed inside the debounce window; it will fire later.
    Debounced,
    /// Fetched and published, no external edit detected.
    Unchanged(LastModifiedRecord),
    /// Fetched and published, and someone else modified the metadata since
    /// the stored record. The caller surfaces a one-shot notification.
    ExternalChange(LastModifiedRecord),
    /// A newer fetch fired while this one was in flight; result discarded.
    Superseded,
}

/// Drives last-modified refreshes for all tracked metadata of one org:
/// loads stored records lazily, debounces triggers per file, fetches through
/// the remote API and persists accepted records back to disk.
pub struct ProvenanceService<C: Clock + Clone> {
    clock: C,
    api: Arc<dyn MetadataApi>,
    store: RecordStore,
    org_id: String,
    min_interval: Duration,
    trackers: HashMap<(MetadataType, String), ProvenanceTracker<C>>,
}

impl<C: Clock + Clone> ProvenanceService<C> {
    pub fn new(
        clock: C,
        api: Arc<dyn MetadataApi>,
        store: RecordStore,
        org_id: impl Into<String>,
        min_interval: Duration,
    ) -> Self {
        Self {
            clock,
            api,
            store,
            org_id: org_id.into(),
            min_interval,
            trackers: HashMap::new(),
        }
    }

    /// Handle a refresh trigger (editor focus, save, poll timer).
    pub async fn refresh(&mut self, info: &MetadataInfo) -> Result<RefreshOutcome, Error> {
        let Some(generation) = self.tracker_for(info).on_trigger() else {
            debug!(
                "refresh for {} '{}' deferred by debounce",
                info.metadata_type, info.api_name
            );
            return Ok(RefreshOutcome::Debounced);
        };

        self.complete_fetch(info, generation).await
    }

    /// Release a deferred refresh for `info` if its window has elapsed.
    pub async fn poll(&mut self, info: &MetadataInfo) -> Result<Option<RefreshOutcome>, Error> {
        let Some(generation) = self.tracker_for(info).poll_deferred() else {
            return Ok(None);
        };

        self.complete_fetch(info, generation).await.map(Some)
    }

    /// Release every deferred refresh whose window has elapsed, returning
    /// the outcome for each. Fetch failures are logged and skipped so one
    /// unreachable org cannot stall the rest.
    pub async fn flush_due(&mut self) -> Vec<(MetadataInfo, RefreshOutcome)> {
        let now = self.clock.now();
        let due: Vec<MetadataInfo> = self
            .trackers
            .iter()
            .filter(|(_, tracker)| {
                tracker
                    .deferred_ready_at()
                    .is_some_and(|ready_at| ready_at <= now)
            })
            .map(|((metadata_type, api_name), _)| MetadataInfo {
                metadata_type: *metadata_type,
                api_name: api_name.clone(),
            })
            .collect();

        let mut released = Vec::new();
        for info in due {
            match self.poll(&info).await {
                Ok(Some(outcome)) => released.push((info, outcome)),
                Ok(None) => {}
                Err(e) => warn!(
                    "deferred refresh for {} '{}' failed: {e}",
                    info.metadata_type, info.api_name
                ),
            }
        }

        released
    }

    /// Earliest instant at which any deferred refresh becomes due.
    pub fn next_deferred_at(&self) -> Option<DateTime<Utc>> {
        self.trackers
            .values()
            .filter_map(ProvenanceTracker::deferred_ready_at)
            .min()
    }

    /// The stored record for `info`, loading it from disk on first touch.
    pub fn stored(&mut self, info: &MetadataInfo) -> Option<LastModifiedRecord> {
        self.tracker_for(info).stored().cloned()
    }

    async fn complete_fetch(
        &mut self,
        info: &MetadataInfo,
        generation: u64,
    ) -> Result<RefreshOutcome, Error> {
        let api = Arc::clone(&self.api);
        let fetched = api
            .fetch_last_modified(info.metadata_type, &info.api_name)
            .await;

        match fetched {
            Ok(remote) => {
                let fresh = LastModifiedRecord::from_remote(remote, self.clock.now());
                match self.tracker_for(info).on_success(generation, fresh.clone()) {
                    Completion::Published { external_change } => {
                        // A failed write degrades to refetching next time; the
                        // in-memory state is already current.
                        if let Err(e) = self.store.save(
                            &self.org_id,
                            info.metadata_type,
                            &info.api_name,
                            &fresh,
                        ) {
                            warn!(
                                "failed to persist record for {} '{}': {e}",
                                info.metadata_type, info.api_name
                            );
                        }

                        if external_change {
                            Ok(RefreshOutcome::ExternalChange(fresh))
                        } else {
                            Ok(RefreshOutcome::Unchanged(fresh))
                        }
                    }
                    Completion::Stale => Ok(RefreshOutcome::Superseded),
                }
            }
            Err(e) => {
                self.tracker_for(info).on_failure(generation);
                Err(e)
            }
        }
    }

    fn tracker_for(&mut self, info: &MetadataInfo) -> &mut ProvenanceTracker<C> {
        let Self {
            trackers,
            store,
            clock,
            org_id,
            min_interval,
            ..
        } = self;

        trackers
            .entry((info.metadata_type, info.api_name.clone()))
            .or_insert_with(|| {
                let stored = store.load(org_id, info.metadata_type, &info.api_name);
                ProvenanceTracker::new(clock.clone(), *min_interval, stored)
            })
    }
}
