//! Finality latency scraper: measures how long L2 transactions take to be finalized on L1 by
//! scraping block explorers, either as a batch scan or on demand over HTTP.

pub mod config;
pub mod scan;
pub mod server;

use std::sync::Arc;

use finality_scraper_explorer::{Explorer, HttpFetcher};
use tokio_util::sync::CancellationToken;

use crate::config::ExplorerConfig;

/// Operating mode, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Scan listing pages once, persist and report latencies.
    Scan,
    /// Answer `/root_end` requests over HTTP.
    Server,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Scan => "scan",
            Mode::Server => "server",
        }
    }
}

/// Explorer over HTTP, bounded by the configured deadline and stopped by `stop`.
pub fn http_explorer(
    config: &ExplorerConfig,
    stop: CancellationToken,
) -> anyhow::Result<Explorer> {
    let fetcher = HttpFetcher::new(config.rotate_user_agent)?;
    Ok(Explorer::new(Arc::new(fetcher), config.fetch_timeout, stop))
}
