//! Access to block explorer pages: fetching, deadline and cancellation handling, and CSS
//! selector queries over the parsed document.

mod error;
mod explorer;
mod fetcher;
mod metrics;
mod page;
mod selectors;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixture;

pub use error::ScrapeError;
pub use explorer::Explorer;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use page::{Element, HtmlPage};
pub use selectors::{ROOT_ANCHOR_TIMESTAMP, SYSTEM_ADDRESS, Selectors};
