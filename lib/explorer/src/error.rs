use finality_scraper_types::parse::TimestampError;

/// Failure to obtain a value from an explorer page.
///
/// Cloneable so that one failed root-anchor fetch can be handed to every transaction waiting
/// on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeError {
    #[error("{element} element not found")]
    SelectorMiss { element: &'static str },
    #[error("{element} element has no `{attribute}` attribute")]
    AttributeMissing {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Error parsing timestamp: {0}")]
    Timestamp(#[from] TimestampError),
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Timed out fetching {0}")]
    Timeout(String),
    #[error("Scraping was cancelled")]
    Cancelled,
    #[error("Invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("Invalid URL `{0}`")]
    InvalidUrl(String),
}

impl ScrapeError {
    pub fn fetch(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }
}
