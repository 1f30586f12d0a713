use std::time::Duration;

use vise::{Buckets, Counter, Histogram, LabeledFamily, Metrics, Unit};

#[derive(Debug, Metrics)]
#[metrics(prefix = "finality_server")]
pub(super) struct ServerMetrics {
    /// Time to answer a `/root_end` request
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub request_latency: Histogram<Duration>,
    /// Failed `/root_end` requests by response status
    #[metrics(labels = ["status"])]
    pub errors: LabeledFamily<&'static str, Counter>,
}

#[vise::register]
pub(super) static SERVER_METRICS: vise::Global<ServerMetrics> = vise::Global::new();
