use dashmap::{DashMap, Entry};
use finality_scraper_explorer::ScrapeError;
use finality_scraper_types::{RootReference, UnixMillis};
use tokio::sync::watch;

use crate::metrics::{CacheLookup, STAGE_METRICS};

/// Result of one root-anchor fetch, shared by every transaction anchored by it.
pub type AnchorOutcome = Result<UnixMillis, ScrapeError>;

/// Coalesces root-anchor fetches: at most one fetch per distinct reference is in flight, and
/// every transaction sighting the same reference observes the same outcome.
#[derive(Debug)]
pub struct AnchorCache {
    entries: DashMap<RootReference, watch::Receiver<Option<AnchorOutcome>>>,
    evict_failures: bool,
}

/// Outcome of looking a reference up in the cache.
#[derive(Debug)]
pub(crate) enum Sighting {
    /// The caller must fetch the page and publish the outcome with [`AnchorCache::resolve`].
    First(PendingAnchor),
    Repeat(watch::Receiver<Option<AnchorOutcome>>),
}

/// Right and duty to resolve a freshly inserted entry.
#[derive(Debug)]
pub(crate) struct PendingAnchor {
    sender: watch::Sender<Option<AnchorOutcome>>,
}

impl AnchorCache {
    /// Cache that keeps every outcome for the lifetime of the process.
    pub fn keep_all() -> Self {
        Self {
            entries: DashMap::new(),
            evict_failures: false,
        }
    }

    /// Cache that forgets failed outcomes once published, so that a later sighting fetches
    /// again.
    pub fn evicting_failures() -> Self {
        Self {
            entries: DashMap::new(),
            evict_failures: true,
        }
    }

    pub(crate) fn sight(&self, reference: &RootReference) -> Sighting {
        match self.entries.entry(reference.clone()) {
            Entry::Occupied(entry) => {
                STAGE_METRICS.anchor_cache[&CacheLookup::Hit].inc();
                Sighting::Repeat(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                STAGE_METRICS.anchor_cache[&CacheLookup::Miss].inc();
                let (sender, receiver) = watch::channel(None);
                entry.insert(receiver);
                Sighting::First(PendingAnchor { sender })
            }
        }
    }

    pub(crate) fn resolve(
        &self,
        reference: &RootReference,
        pending: PendingAnchor,
        outcome: AnchorOutcome,
    ) {
        let failed = outcome.is_err();
        pending.sender.send_replace(Some(outcome));
        if failed && self.evict_failures {
            self.entries.remove(reference);
            STAGE_METRICS.evicted_anchors.inc();
        }
    }
}

impl PendingAnchor {
    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<AnchorOutcome>> {
        self.sender.subscribe()
    }
}

/// Waits until the entry behind `receiver` is resolved.
pub(crate) async fn outcome(mut receiver: watch::Receiver<Option<AnchorOutcome>>) -> AnchorOutcome {
    receiver
        .wait_for(Option::is_some)
        .await
        .map(|outcome| (*outcome).clone())
        .ok()
        .flatten()
        // The resolving task went away without publishing anything.
        .unwrap_or(Err(ScrapeError::Cancelled))
}
