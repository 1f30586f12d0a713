use clap::Parser;
use finality_scraper::config::Config;
use finality_scraper::scan::run_scan;
use finality_scraper::server::run_server;
use finality_scraper::{Mode, http_explorer};
use finality_scraper_observability::{LogFormat, Sentry, init_logs, run_exporter};
use tokio_util::sync::CancellationToken;

/// Measures L2 finality latency by scraping block explorers.
///
/// Everything except the mode is configured through environment variables, e.g.
/// `SCAN_FROM_CHAIN`, `SCAN_PAGES` or `SERVER_ADDRESS`.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "MODE", value_enum)]
    mode: Mode,
}

fn report_exit<T, E: std::fmt::Debug>(name: &'static str) -> impl Fn(Result<T, E>) {
    move |result| match result {
        Ok(_) => tracing::info!("{name} exited"),
        Err(e) => tracing::error!("{name} failed: {e:#?}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let sentry = config
        .observability
        .sentry_url
        .as_deref()
        .map(Sentry::new)
        .transpose()?
        .map(|sentry| {
            sentry
                .with_release(env!("CARGO_PKG_VERSION"))
                .with_mode(cli.mode.as_str())
        });
    let log_format: LogFormat = config.observability.log_format.parse()?;
    init_logs(log_format, sentry.as_ref())?;
    let _sentry_guard = sentry.map(Sentry::install);

    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl-C, stopping");
                stop.cancel();
            }
        }
    });
    if let Some(port) = config.observability.prometheus_port {
        let exporter = run_exporter(port, stop.clone());
        tokio::spawn(async move { report_exit("metrics exporter")(exporter.await) });
    }

    let explorer = http_explorer(&config.explorer, stop.clone())?;
    tracing::info!(mode = cli.mode.as_str(), "starting finality scraper");
    match cli.mode {
        Mode::Scan => {
            let report = run_scan(&config.scan, explorer).await?;
            println!("{}", report.summary());
        }
        Mode::Server => run_server(&config.server, explorer, stop.clone()).await?,
    }
    stop.cancel();
    Ok(())
}
