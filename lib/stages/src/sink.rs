use std::sync::Arc;

use dashmap::DashMap;
use finality_scraper_explorer::ScrapeError;
use finality_scraper_latency_store::{LatencyStore, StoreError};
use finality_scraper_types::{LatencyField, TransactionHash, UnixMillis};
use tokio::sync::oneshot;
use vise::{EncodeLabelSet, EncodeLabelValue};

use crate::metrics::STAGE_METRICS;

/// Per-hash step that can fail terminally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "step", rename_all = "snake_case")]
pub enum Step {
    /// Fetching the transaction detail page.
    DetailPage,
    StartTimestamp,
    RootReference,
    /// Fetching or parsing the root-anchor page.
    RootAnchor,
}

/// Receives the per-hash results of the detail and root-anchor stages.
///
/// Chosen once when the pipeline is built; the stages never branch on the mode.
pub trait CompletionSink: Send + Sync + 'static {
    fn on_start(&self, hash: &TransactionHash, timestamp: UnixMillis);

    fn on_root_end(&self, hash: &TransactionHash, timestamp: UnixMillis);

    fn on_failure(&self, hash: &TransactionHash, step: Step, err: ScrapeError);
}

/// Batch sink: fills the latency store and drops hashes on the first failure.
#[derive(Debug, Clone)]
pub struct ScanSink {
    store: Arc<LatencyStore>,
}

impl ScanSink {
    pub fn new(store: Arc<LatencyStore>) -> Self {
        Self { store }
    }

    fn set(&self, hash: &TransactionHash, field: LatencyField, timestamp: UnixMillis) {
        match self.store.set_field(hash, field, timestamp) {
            Ok(()) => tracing::debug!(%hash, %field, timestamp, "latency field recorded"),
            // Another step already failed for this hash.
            Err(StoreError::UnknownHash(_)) => {
                tracing::debug!(%hash, %field, "ignoring result for dropped hash")
            }
        }
    }
}

impl CompletionSink for ScanSink {
    fn on_start(&self, hash: &TransactionHash, timestamp: UnixMillis) {
        self.set(hash, LatencyField::Start, timestamp);
    }

    fn on_root_end(&self, hash: &TransactionHash, timestamp: UnixMillis) {
        self.set(hash, LatencyField::RootEnd, timestamp);
    }

    fn on_failure(&self, hash: &TransactionHash, step: Step, err: ScrapeError) {
        tracing::warn!(%hash, ?step, %err, "dropping transaction");
        STAGE_METRICS.failures[&step].inc();
        self.store.remove(hash);
    }
}

/// Final result of an on-demand request.
pub type RootEndResult = Result<UnixMillis, ScrapeError>;

/// Waiters of on-demand requests, keyed by transaction hash.
#[derive(Debug, Default)]
pub struct ResponseRouter {
    waiters: DashMap<TransactionHash, Vec<oneshot::Sender<RootEndResult>>>,
}

/// Waiter handed out by [`ResponseRouter::register`].
#[derive(Debug)]
pub struct Registration {
    pub receiver: oneshot::Receiver<RootEndResult>,
    /// Whether no other request for the hash was pending. Only the first registration needs
    /// to submit the hash to the pipeline.
    pub first: bool,
}

impl ResponseRouter {
    pub fn register(&self, hash: TransactionHash) -> Registration {
        let (sender, receiver) = oneshot::channel();
        let mut waiters = self.waiters.entry(hash).or_default();
        let first = waiters.is_empty();
        waiters.push(sender);
        Registration { receiver, first }
    }

    /// Delivers `result` to every request waiting on `hash`. Returns how many were waiting.
    pub fn resolve(&self, hash: &TransactionHash, result: RootEndResult) -> usize {
        let Some((_, waiters)) = self.waiters.remove(hash) else {
            tracing::debug!(%hash, "no request is waiting for this hash");
            return 0;
        };
        let count = waiters.len();
        for waiter in waiters {
            // The request may have given up already.
            let _ = waiter.send(result.clone());
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.waiters.len()
    }
}

/// On-demand sink: routes the root-anchor outcome to the waiting request.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    router: Arc<ResponseRouter>,
}

impl ResponseSink {
    pub fn new(router: Arc<ResponseRouter>) -> Self {
        Self { router }
    }
}

impl CompletionSink for ResponseSink {
    fn on_start(&self, _hash: &TransactionHash, _timestamp: UnixMillis) {}

    fn on_root_end(&self, hash: &TransactionHash, timestamp: UnixMillis) {
        self.router.resolve(hash, Ok(timestamp));
    }

    fn on_failure(&self, hash: &TransactionHash, step: Step, err: ScrapeError) {
        if step == Step::StartTimestamp {
            return;
        }
        tracing::warn!(%hash, ?step, %err, "request failed");
        STAGE_METRICS.failures[&step].inc();
        self.router.resolve(hash, Err(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_sink_drops_failed_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LatencyStore::open(dir.path().join("data.csv")).unwrap());
        let sink = ScanSink::new(store.clone());
        let hash = TransactionHash::from("0x01");
        store.begin(hash.clone());

        sink.on_start(&hash, 100);
        assert_eq!(store.get(&hash).unwrap().start, Some(100));

        sink.on_failure(&hash, Step::RootAnchor, ScrapeError::Cancelled);
        assert!(!store.contains(&hash));
        // A late success for a dropped hash is a no-op.
        sink.on_root_end(&hash, 200);
        assert!(!store.contains(&hash));
    }

    #[tokio::test]
    async fn router_fans_out_to_all_waiters() {
        let router = Arc::new(ResponseRouter::default());
        let sink = ResponseSink::new(router.clone());
        let hash = TransactionHash::from("0x01");

        let first = router.register(hash.clone());
        let second = router.register(hash.clone());
        assert!(first.first);
        assert!(!second.first);

        sink.on_failure(&hash, Step::StartTimestamp, ScrapeError::Cancelled);
        assert_eq!(router.pending(), 1);

        sink.on_root_end(&hash, 1_700_000_000_000);
        assert_eq!(first.receiver.await.unwrap(), Ok(1_700_000_000_000));
        assert_eq!(second.receiver.await.unwrap(), Ok(1_700_000_000_000));
        assert_eq!(router.pending(), 0);
        assert_eq!(router.resolve(&hash, Ok(0)), 0);
    }

    #[tokio::test]
    async fn router_delivers_errors() {
        let router = Arc::new(ResponseRouter::default());
        let sink = ResponseSink::new(router.clone());
        let hash = TransactionHash::from("0x01");
        let registration = router.register(hash.clone());

        let err = ScrapeError::SelectorMiss {
            element: "root reference",
        };
        sink.on_failure(&hash, Step::RootReference, err.clone());
        assert_eq!(registration.receiver.await.unwrap(), Err(err));
    }
}
