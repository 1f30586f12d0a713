use std::sync::Arc;

use async_trait::async_trait;
use finality_scraper_explorer::{Explorer, Selectors};
use finality_scraper_latency_store::LatencyStore;
use finality_scraper_pipeline::{PipelineComponent, StageReceiver};
use finality_scraper_types::ChainId;
use tokio::sync::mpsc;

use crate::extract::{ListingRow, listing_rows};
use crate::metrics::STAGE_METRICS;
use crate::{DetailRequest, Tracked, WorkTracker};

/// Turns listing page numbers into newly seen transaction hashes.
///
/// Each page is processed in its own task. A hash is forwarded only if the latency store was
/// not tracking it yet, in which case an empty record is created for it.
pub struct ListingStage {
    pub chain: ChainId,
    pub explorer: Explorer,
    pub store: Arc<LatencyStore>,
    pub tracker: WorkTracker,
}

#[async_trait]
impl PipelineComponent for ListingStage {
    type Input = Tracked<u32>;
    type Output = Tracked<DetailRequest>;

    const NAME: &'static str = "listing";
    const OUTPUT_BUFFER_SIZE: usize = 64;

    async fn run(
        self,
        mut input: StageReceiver<Tracked<u32>>,
        output: mpsc::Sender<Tracked<DetailRequest>>,
    ) -> anyhow::Result<()> {
        let stage = Arc::new(self);
        while let Some(page) = input.recv().await {
            let stage = stage.clone();
            let output = output.clone();
            tokio::spawn(async move { stage.process_page(page, output).await });
        }
        Ok(())
    }
}

impl ListingStage {
    async fn process_page(
        &self,
        page: Tracked<u32>,
        output: mpsc::Sender<Tracked<DetailRequest>>,
    ) {
        let (page, _guard) = page.into_parts();
        let url = self.chain.listing_url(page);
        let selectors = Selectors::for_family(self.chain.family());

        let rows = match self
            .explorer
            .open(&url)
            .await
            .and_then(|html| listing_rows(&html, selectors))
        {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(page, %err, "skipping listing page");
                return;
            }
        };

        let mut forwarded = 0;
        for row in rows {
            let hash = match row {
                Ok(ListingRow::Transaction(hash)) => hash,
                Ok(ListingRow::System) => {
                    STAGE_METRICS.skipped_rows.inc();
                    continue;
                }
                Err(err) => {
                    tracing::warn!(page, %err, "skipping listing row");
                    STAGE_METRICS.skipped_rows.inc();
                    continue;
                }
            };
            if !self.store.begin(hash.clone()) {
                tracing::debug!(page, %hash, "hash already tracked or logged");
                continue;
            }

            let request = self.tracker.track_item(DetailRequest {
                chain: self.chain,
                hash: hash.clone(),
            });
            if output.send(request).await.is_err() {
                tracing::warn!(page, %hash, "detail stage is gone, dropping transaction");
                self.store.remove(&hash);
                return;
            }
            forwarded += 1;
            STAGE_METRICS.forwarded_hashes.inc();
        }
        tracing::info!(page, forwarded, "listing page processed");
    }
}
