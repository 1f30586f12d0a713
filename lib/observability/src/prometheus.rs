use std::net::{Ipv4Addr, SocketAddr};

use tokio_util::sync::CancellationToken;
use vise_exporter::MetricsExporter;

/// Serves every registered `vise` metric at `/metrics` until `stop` is cancelled.
pub async fn run_exporter(port: u16, stop: CancellationToken) -> anyhow::Result<()> {
    let bind_address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    tracing::info!("starting metrics exporter on {bind_address}");

    MetricsExporter::default()
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .start(bind_address)
        .await
        .map_err(|err| anyhow::anyhow!("metrics exporter failed: {err}"))?;
    tracing::info!("metrics exporter stopped");
    Ok(())
}
