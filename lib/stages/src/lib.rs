//! Scraping stages of the finality pipeline and the shared state that connects them.
//!
//! ```text
//! page numbers -> ListingStage -> DetailStage -> AnchorStage -> CompletionSink
//! ```
//!
//! Stages fan out one task per item. Every queued item and every spawned task holds a
//! [`WorkGuard`], so [`WorkTracker::wait`] resolves once everything caused by the initial
//! input has finished.

mod anchor;
mod anchor_cache;
mod detail;
mod extract;
mod listing;
mod metrics;
mod sink;
mod tracker;

pub use anchor::AnchorStage;
pub use anchor_cache::{AnchorCache, AnchorOutcome};
pub use detail::DetailStage;
pub use listing::ListingStage;
pub use sink::{
    CompletionSink, Registration, ResponseRouter, ResponseSink, RootEndResult, ScanSink, Step,
};
pub use tracker::{Tracked, WorkGuard, WorkTracker};

use finality_scraper_types::{ChainId, RootReference, TransactionHash};

/// Transaction whose detail page should be scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub chain: ChainId,
    pub hash: TransactionHash,
}

/// Transaction waiting for the root anchor behind `reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRequest {
    pub hash: TransactionHash,
    pub reference: RootReference,
}
