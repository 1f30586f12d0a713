use std::sync::Arc;

use async_trait::async_trait;
use finality_scraper_explorer::{Explorer, ScrapeError, Selectors};
use finality_scraper_pipeline::{PipelineComponent, StageReceiver};
use tokio::sync::mpsc;

use crate::extract::{Detail, detail};
use crate::{AnchorRequest, CompletionSink, DetailRequest, Step, Tracked, WorkTracker};

/// Scrapes the start timestamp and the root reference of each transaction.
///
/// The two values succeed or fail independently: the start timestamp goes straight to the
/// sink while the reference is forwarded to the root-anchor stage.
pub struct DetailStage {
    pub explorer: Explorer,
    pub sink: Arc<dyn CompletionSink>,
    pub tracker: WorkTracker,
}

#[async_trait]
impl PipelineComponent for DetailStage {
    type Input = Tracked<DetailRequest>;
    type Output = Tracked<AnchorRequest>;

    const NAME: &'static str = "detail";
    const OUTPUT_BUFFER_SIZE: usize = 64;

    async fn run(
        self,
        mut input: StageReceiver<Tracked<DetailRequest>>,
        output: mpsc::Sender<Tracked<AnchorRequest>>,
    ) -> anyhow::Result<()> {
        let stage = Arc::new(self);
        while let Some(request) = input.recv().await {
            let stage = stage.clone();
            let output = output.clone();
            tokio::spawn(async move { stage.process(request, output).await });
        }
        Ok(())
    }
}

impl DetailStage {
    async fn process(
        &self,
        request: Tracked<DetailRequest>,
        output: mpsc::Sender<Tracked<AnchorRequest>>,
    ) {
        let (DetailRequest { chain, hash }, _guard) = request.into_parts();
        let url = chain.transaction_url(&hash);
        let selectors = Selectors::for_family(chain.family());

        let Detail { start, reference } = match self
            .explorer
            .open(&url)
            .await
            .map(|html| detail(&html, selectors))
        {
            Ok(detail) => detail,
            Err(err) => {
                self.sink.on_failure(&hash, Step::DetailPage, err);
                return;
            }
        };

        match start {
            Ok(timestamp) => self.sink.on_start(&hash, timestamp),
            Err(err) => self.sink.on_failure(&hash, Step::StartTimestamp, err),
        }

        let reference = match reference {
            Ok(reference) => reference,
            Err(err) => {
                self.sink.on_failure(&hash, Step::RootReference, err);
                return;
            }
        };
        tracing::debug!(%hash, %reference, "root reference found");
        let request = self.tracker.track_item(AnchorRequest {
            hash: hash.clone(),
            reference,
        });
        if output.send(request).await.is_err() {
            self.sink
                .on_failure(&hash, Step::RootAnchor, ScrapeError::Cancelled);
        }
    }
}
