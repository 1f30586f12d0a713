//! In-memory explorer for tests.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{PageFetcher, ScrapeError};

/// Serves canned pages by exact URL and counts how often each URL was fetched.
///
/// Unknown URLs fail with [`ScrapeError::Fetch`], as a 404 from a real explorer would.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: DashMap<String, String>,
    delays: DashMap<String, Duration>,
    fetches: DashMap<String, usize>,
}

impl FixtureFetcher {
    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }

    /// Makes every fetch of `url` take `delay` before responding.
    pub fn delay(&self, url: impl Into<String>, delay: Duration) {
        self.delays.insert(url.into(), delay);
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.get(url).map_or(0, |count| *count)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        *self.fetches.entry(url.to_owned()).or_default() += 1;

        let delay = self.delays.get(url).map(|delay| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .get(url)
            .map(|body| body.value().clone())
            .ok_or_else(|| ScrapeError::fetch(url, "HTTP status client error (404 Not Found)"))
    }
}

/// Listing page in the Etherscan layout with one row per `(hash, from)` pair.
pub fn listing_page<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let rows: String = rows
        .into_iter()
        .map(|(hash, from)| {
            format!(
                "<tr><td></td><td><a href=\"/tx/{hash}\">{hash}</a></td>\
                 <td></td><td></td><td></td><td></td><td>{from}</td></tr>"
            )
        })
        .collect();
    format!("<html><body><table><tbody>{rows}</tbody></table></body></html>")
}

/// Transaction detail page. `None` leaves the corresponding element out.
pub fn detail_page(start: Option<&str>, root_reference: Option<&str>) -> String {
    let start = start.map_or(String::new(), |start| {
        format!(
            "<div id=\"ContentPlaceHolder1_divTimeStamp\"><div>\
             <div>Timestamp:</div><div>{start}</div></div></div>"
        )
    });
    let reference = root_reference.map_or(String::new(), |href| {
        format!(
            "<div id=\"ContentPlaceHolder1_l1TransactionRow\"><div>\
             <div>L1 State Batch:</div><div><a href=\"{href}\">batch</a></div></div></div>"
        )
    });
    format!("<html><body>{start}{reference}</body></html>")
}

/// Root-anchor page on the L1 explorer.
pub fn anchor_page(timestamp: &str) -> String {
    format!("<html><body><span id=\"showUtcLocalDate\">{timestamp}</span></body></html>")
}
