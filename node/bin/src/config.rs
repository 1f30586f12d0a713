use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use smart_config::metadata::TimeUnit;
use smart_config::{
    ConfigRepository, ConfigSchema, DescribeConfig, DeserializeConfig, Environment,
};

/// Batch scan of recent transactions.
#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct ScanConfig {
    /// Identifier of the chain to scan, e.g. `10` for Optimism.
    #[config(default_t = "10".into())]
    pub from_chain: String,
    /// Listing pages to scan, e.g. `1-3,7`.
    #[config(default_t = "1".into())]
    pub pages: String,
    /// Append-only log of measured latencies.
    #[config(default_t = "data.csv".into())]
    pub log_path: PathBuf,
}

/// On-demand HTTP server.
#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct ServerConfig {
    #[config(default_t = "0.0.0.0:8080".into())]
    pub address: String,
    /// Time a `/root_end` request may wait for the pipeline.
    #[config(default_t = 2 * TimeUnit::Minutes)]
    pub request_timeout: Duration,
}

#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct ExplorerConfig {
    /// Deadline for fetching a single page.
    #[config(default_t = 30 * TimeUnit::Seconds)]
    pub fetch_timeout: Duration,
    /// Send a random browser user agent with every request.
    #[config(default_t = true)]
    pub rotate_user_agent: bool,
}

#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct ObservabilityConfig {
    /// `logfmt`, `json` or `terminal`.
    #[config(default_t = "logfmt".into())]
    pub log_format: String,
    /// Port to expose Prometheus metrics on. Metrics are not exported if unset.
    pub prometheus_port: Option<u16>,
    /// Sentry DSN. Warnings and errors are reported if set.
    pub sentry_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub scan: ScanConfig,
    pub server: ServerConfig,
    pub explorer: ExplorerConfig,
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Reads the configuration from environment variables named `{SECTION}_{FIELD}`, e.g.
    /// `SCAN_PAGES` or `EXPLORER_FETCH_TIMEOUT`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut schema = ConfigSchema::default();
        schema.insert(&ScanConfig::DESCRIPTION, "scan")?;
        schema.insert(&ServerConfig::DESCRIPTION, "server")?;
        schema.insert(&ExplorerConfig::DESCRIPTION, "explorer")?;
        schema.insert(&ObservabilityConfig::DESCRIPTION, "observability")?;
        let repo = ConfigRepository::new(&schema).with(Environment::prefixed(""));

        Ok(Self {
            scan: parse(&repo, "scan")?,
            server: parse(&repo, "server")?,
            explorer: parse(&repo, "explorer")?,
            observability: parse(&repo, "observability")?,
        })
    }
}

fn parse<C: DeserializeConfig>(repo: &ConfigRepository<'_>, section: &str) -> anyhow::Result<C> {
    repo.single::<C>()
        .with_context(|| format!("`{section}` config is not registered"))?
        .parse()
        .map_err(|errors| anyhow::anyhow!("invalid `{section}` config: {errors:?}"))
}
