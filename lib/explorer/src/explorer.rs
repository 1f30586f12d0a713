use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::metrics::{EXPLORER_METRICS, FetchOutcome};
use crate::{HtmlPage, PageFetcher, ScrapeError};

/// Shared handle through which all stages open explorer pages.
///
/// Every fetch is bounded by `fetch_timeout` and aborted once `stop` is cancelled.
#[derive(Clone)]
pub struct Explorer {
    fetcher: Arc<dyn PageFetcher>,
    fetch_timeout: Duration,
    stop: CancellationToken,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("stopped", &self.stop.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Explorer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        fetch_timeout: Duration,
        stop: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            fetch_timeout,
            stop,
        }
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    pub async fn open(&self, url: &str) -> Result<HtmlPage, ScrapeError> {
        if self.stop.is_cancelled() {
            EXPLORER_METRICS.fetches[&FetchOutcome::Cancelled].inc();
            return Err(ScrapeError::Cancelled);
        }

        let latency = EXPLORER_METRICS.fetch_latency.start();
        let result = tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(ScrapeError::Cancelled),
            result = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(url)) => {
                result.unwrap_or_else(|_| Err(ScrapeError::Timeout(url.to_owned())))
            }
        };

        let outcome = match &result {
            Ok(_) => FetchOutcome::Success,
            Err(ScrapeError::Timeout(_)) => FetchOutcome::Timeout,
            Err(ScrapeError::Cancelled) => FetchOutcome::Cancelled,
            Err(_) => FetchOutcome::Failure,
        };
        EXPLORER_METRICS.fetches[&outcome].inc();

        match result {
            Ok(body) => {
                let page = HtmlPage::parse(&body);
                latency.observe();
                Ok(page)
            }
            Err(err) => {
                tracing::warn!(url, %err, "failed to open explorer page");
                Err(err)
            }
        }
    }
}
