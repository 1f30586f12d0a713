use vise::{Counter, EncodeLabelSet, EncodeLabelValue, Family, Gauge, Metrics};

use crate::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "cache", rename_all = "snake_case")]
pub(crate) enum CacheLookup {
    Hit,
    Miss,
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "scraper_stages")]
pub(crate) struct StageMetrics {
    /// Units of work registered with the tracker and not yet released
    pub outstanding_work: Gauge<usize>,
    /// Listing rows dropped, either system transactions or rows missing a cell
    pub skipped_rows: Counter,
    /// Hashes handed from the listing stage to the detail stage
    pub forwarded_hashes: Counter,
    /// Terminal per-hash failures by the step that failed
    pub failures: Family<Step, Counter>,
    /// Root-anchor cache lookups
    pub anchor_cache: Family<CacheLookup, Counter>,
    pub evicted_anchors: Counter,
}

#[vise::register]
pub(crate) static STAGE_METRICS: vise::Global<StageMetrics> = vise::Global::new();
