use std::time::Duration;

use vise::{Buckets, Counter, EncodeLabelSet, EncodeLabelValue, Family, Histogram, Metrics, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "outcome", rename_all = "snake_case")]
pub(crate) enum FetchOutcome {
    Success,
    Failure,
    Timeout,
    Cancelled,
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "explorer")]
pub(crate) struct ExplorerMetrics {
    /// Time to fetch and parse one explorer page
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub fetch_latency: Histogram<Duration>,
    /// Page fetches by outcome
    pub fetches: Family<FetchOutcome, Counter>,
}

#[vise::register]
pub(crate) static EXPLORER_METRICS: vise::Global<ExplorerMetrics> = vise::Global::new();
