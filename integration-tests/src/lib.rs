//! Fixture explorer and helpers shared by the end-to-end tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use finality_scraper::config::ScanConfig;
use finality_scraper_explorer::Explorer;
use finality_scraper_explorer::fixture::{
    FixtureFetcher, anchor_page, detail_page, listing_page,
};
use finality_scraper_types::{ChainId, L1_EXPLORER_URL, TransactionHash};
use tokio_util::sync::CancellationToken;

/// Explorer timestamps and their values in milliseconds since the epoch.
pub mod times {
    pub const T0: &str = "Jan-05-2024 09:15:30 AM +UTC";
    pub const T0_MS: i64 = 1_704_446_130_000;
    /// Ten minutes after `T0`.
    pub const T10: &str = "Jan-05-2024 09:25:30 AM +UTC";
    pub const T10_MS: i64 = 1_704_446_730_000;
    /// Twenty minutes after `T0`.
    pub const T20: &str = "Jan-05-2024 09:35:30 AM +UTC";
    pub const T20_MS: i64 = 1_704_447_330_000;
}

/// In-memory copy of the L2 and L1 explorers.
pub struct Tester {
    pub fetcher: Arc<FixtureFetcher>,
    pub stop: CancellationToken,
    pub fetch_timeout: Duration,
    dir: tempfile::TempDir,
}

impl Tester {
    pub fn setup() -> anyhow::Result<Self> {
        Ok(Self {
            fetcher: Arc::new(FixtureFetcher::default()),
            stop: CancellationToken::new(),
            fetch_timeout: Duration::from_secs(5),
            dir: tempfile::tempdir()?,
        })
    }

    pub fn explorer(&self) -> Explorer {
        Explorer::new(self.fetcher.clone(), self.fetch_timeout, self.stop.clone())
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("data.csv")
    }

    pub fn scan_config(&self, chain: ChainId, pages: &str) -> ScanConfig {
        ScanConfig {
            from_chain: chain.to_string(),
            pages: pages.to_owned(),
            log_path: self.log_path(),
        }
    }

    /// Listing page `page` of `chain`, with `(hash, from)` rows.
    pub fn listing(&self, chain: ChainId, page: u32, rows: &[(&str, &str)]) {
        self.fetcher
            .insert(chain.listing_url(page), listing_page(rows.iter().copied()));
    }

    pub fn transaction(
        &self,
        chain: ChainId,
        hash: &str,
        start: Option<&str>,
        root_reference: Option<&str>,
    ) {
        self.fetcher.insert(
            chain.transaction_url(&TransactionHash::from(hash)),
            detail_page(start, root_reference),
        );
    }

    /// Root-anchor page for a reference relative to the L1 explorer.
    pub fn anchor(&self, root_reference: &str, timestamp: &str) {
        self.fetcher
            .insert(anchor_url(root_reference), anchor_page(timestamp));
    }
}

pub fn anchor_url(root_reference: &str) -> String {
    format!("{L1_EXPLORER_URL}{root_reference}")
}

pub fn transaction_url(chain: ChainId, hash: &str) -> String {
    chain.transaction_url(&TransactionHash::from(hash))
}
