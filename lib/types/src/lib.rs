//! Shared vocabulary of the finality scraper: supported chains, transaction and root-anchor
//! identifiers, latency records, and parsers for the text scraped from explorers.

mod chain;
pub use chain::{ChainFamily, ChainId, L1_EXPLORER_URL, UnknownChain};

mod record;
pub use record::{LatencyField, LatencyRecord, RootReference, TransactionHash, UnixMillis};

pub mod parse;
