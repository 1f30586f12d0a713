use async_trait::async_trait;
use rand::Rng;
use reqwest::header::USER_AGENT;

use crate::ScrapeError;

/// Source of raw explorer pages.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    /// Returns the body of the page at `url`.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/42.0.2311.135 Safari/537.36 Edge/12.246",
    "Mozilla/5.0 (X11; CrOS x86_64 8172.45.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/51.0.2704.64 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_2) AppleWebKit/601.3.9 (KHTML, like Gecko) Version/9.0.2 Safari/601.3.9",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/47.0.2526.111 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:15.0) Gecko/20100101 Firefox/15.0.1",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36 OPR/104.0.0.0",
];

fn random_user_agent() -> &'static str {
    USER_AGENTS[rand::rng().random_range(0..USER_AGENTS.len())]
}

/// Fetches pages over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    rotate_user_agent: bool,
}

impl HttpFetcher {
    pub fn new(rotate_user_agent: bool) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENTS[0])
            .build()?;
        Ok(Self {
            client,
            rotate_user_agent,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let mut request = self.client.get(url);
        if self.rotate_user_agent {
            request = request.header(USER_AGENT, random_user_agent());
        }
        tracing::debug!(url, "opening page");

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| ScrapeError::fetch(url, err))?;
        response
            .text()
            .await
            .map_err(|err| ScrapeError::fetch(url, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_comes_from_the_pool() {
        for _ in 0..32 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }
}
