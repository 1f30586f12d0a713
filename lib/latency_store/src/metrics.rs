use vise::{Counter, Gauge, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "latency_store")]
pub struct LatencyStoreMetrics {
    /// Number of hashes currently tracked, complete or not
    pub records: Gauge<usize>,
    /// Hashes dropped because a stage failed for them
    pub removed: Counter,
    /// Records appended to the durable log
    pub flushed: Counter,
}

#[vise::register]
pub(crate) static LATENCY_STORE_METRICS: vise::Global<LatencyStoreMetrics> = vise::Global::new();
