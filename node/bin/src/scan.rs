use std::sync::Arc;

use anyhow::Context;
use finality_scraper_explorer::Explorer;
use finality_scraper_latency_store::{LatencyStats, LatencyStore};
use finality_scraper_pipeline::Pipeline;
use finality_scraper_stages::{
    AnchorCache, AnchorStage, CompletionSink, DetailStage, ListingStage, ScanSink, WorkTracker,
};
use finality_scraper_types::ChainId;
use finality_scraper_types::parse::{format_duration, parse_page_spec};
use tokio::task::JoinSet;

use crate::config::ScanConfig;

/// Outcome of a completed scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanReport {
    /// Records appended to the log by this scan.
    pub flushed: usize,
    /// Aggregate over all records, including those loaded from the log.
    pub stats: LatencyStats,
}

impl ScanReport {
    pub fn summary(&self) -> String {
        format!(
            "Avg latency: {}; Max: {}",
            format_duration(self.stats.mean_ms),
            format_duration(self.stats.max_ms)
        )
    }
}

/// Scans the configured listing pages, waits until every spawned fetch has finished, then
/// persists and aggregates the measured latencies.
///
/// Cancelling the explorer's stop token makes in-flight work fail fast; whatever completed
/// before that is still persisted.
pub async fn run_scan(config: &ScanConfig, explorer: Explorer) -> anyhow::Result<ScanReport> {
    let chain: ChainId = config.from_chain.parse()?;
    let pages = parse_page_spec(&config.pages)?;
    let store = Arc::new(
        LatencyStore::open(&config.log_path)
            .with_context(|| format!("cannot open latency log {}", config.log_path.display()))?,
    );
    tracing::info!(%chain, pages = pages.len(), "starting scan");

    let tracker = WorkTracker::new();
    let sink: Arc<dyn CompletionSink> = Arc::new(ScanSink::new(store.clone()));
    // Register every page before any of them can finish.
    let pages: Vec<_> = pages
        .into_iter()
        .map(|page| tracker.track_item(page))
        .collect();

    let mut tasks = JoinSet::new();
    Pipeline::from_items(pages)
        .pipe(ListingStage {
            chain,
            explorer: explorer.clone(),
            store: store.clone(),
            tracker: tracker.clone(),
        })
        .pipe(DetailStage {
            explorer: explorer.clone(),
            sink: sink.clone(),
            tracker: tracker.clone(),
        })
        .pipe(AnchorStage {
            explorer: explorer.clone(),
            cache: Arc::new(AnchorCache::keep_all()),
            sink,
            tracker: tracker.clone(),
        })
        .spawn(&mut tasks);

    tracker.wait().await;
    while tasks.join_next().await.is_some() {}
    if explorer.stop_token().is_cancelled() {
        tracing::warn!("scan was interrupted, reporting partial results");
    }

    let flushed = store.flush().context("cannot persist latency records")?;
    let stats = store.aggregate()?;
    let report = ScanReport { flushed, stats };
    tracing::info!(
        flushed,
        count = stats.count,
        mean_ms = stats.mean_ms,
        max_ms = stats.max_ms,
        "scan finished"
    );
    Ok(report)
}
