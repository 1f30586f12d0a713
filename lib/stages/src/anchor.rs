use std::sync::Arc;

use async_trait::async_trait;
use finality_scraper_explorer::{Explorer, ROOT_ANCHOR_TIMESTAMP, ScrapeError};
use finality_scraper_pipeline::{PipelineComponent, StageReceiver};
use finality_scraper_types::RootReference;
use tokio::sync::mpsc;

use crate::anchor_cache::{AnchorCache, AnchorOutcome, PendingAnchor, Sighting, outcome};
use crate::extract::timestamp_at;
use crate::{AnchorRequest, CompletionSink, Step, Tracked, WorkTracker};

/// Resolves the finalization time of each transaction from its root-anchor page.
///
/// Transactions of the same batch share one reference; the page behind it is fetched once
/// and the outcome fanned out to all of them.
pub struct AnchorStage {
    pub explorer: Explorer,
    pub cache: Arc<AnchorCache>,
    pub sink: Arc<dyn CompletionSink>,
    pub tracker: WorkTracker,
}

#[async_trait]
impl PipelineComponent for AnchorStage {
    type Input = Tracked<AnchorRequest>;
    type Output = ();

    const NAME: &'static str = "root_anchor";
    const OUTPUT_BUFFER_SIZE: usize = 1;

    async fn run(
        self,
        mut input: StageReceiver<Tracked<AnchorRequest>>,
        _output: mpsc::Sender<()>,
    ) -> anyhow::Result<()> {
        while let Some(request) = input.recv().await {
            let reference = request.item().reference.clone();
            let receiver = match self.cache.sight(&reference) {
                Sighting::First(pending) => {
                    let receiver = pending.subscribe();
                    self.spawn_fetch(reference, pending);
                    receiver
                }
                Sighting::Repeat(receiver) => {
                    tracing::debug!(%reference, "root anchor already requested");
                    receiver
                }
            };

            let sink = self.sink.clone();
            tokio::spawn(async move {
                let (AnchorRequest { hash, .. }, _guard) = request.into_parts();
                match outcome(receiver).await {
                    Ok(timestamp) => sink.on_root_end(&hash, timestamp),
                    Err(err) => sink.on_failure(&hash, Step::RootAnchor, err),
                }
            });
        }
        Ok(())
    }
}

impl AnchorStage {
    fn spawn_fetch(&self, reference: RootReference, pending: PendingAnchor) {
        let guard = self.tracker.track();
        let explorer = self.explorer.clone();
        let cache = self.cache.clone();
        tokio::spawn(async move {
            let outcome = fetch_anchor(&explorer, &reference).await;
            match &outcome {
                Ok(timestamp) => tracing::info!(%reference, timestamp, "root anchor resolved"),
                Err(err) => tracing::warn!(%reference, %err, "root anchor failed"),
            }
            cache.resolve(&reference, pending, outcome);
            drop(guard);
        });
    }
}

async fn fetch_anchor(explorer: &Explorer, reference: &RootReference) -> AnchorOutcome {
    let url = reference
        .resolve()
        .map_err(|_| ScrapeError::InvalidUrl(reference.to_string()))?;
    explorer
        .open(url.as_str())
        .await
        .and_then(|html| timestamp_at(&html, ROOT_ANCHOR_TIMESTAMP, "root timestamp"))
}
