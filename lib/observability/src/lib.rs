//! Log subscriber setup, error reporting and metrics export shared by all binaries.

mod prometheus;
mod sentry;

use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use crate::prometheus::run_exporter;
pub use crate::sentry::Sentry;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Logfmt,
    Json,
    /// Human-readable, for local runs.
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown log format `{0}`, expected one of `logfmt`, `json`, `terminal`")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logfmt" => Ok(Self::Logfmt),
            "json" => Ok(Self::Json),
            "terminal" => Ok(Self::Terminal),
            _ => Err(UnknownLogFormat(s.to_owned())),
        }
    }
}

/// Installs the global subscriber. Verbosity comes from `RUST_LOG` and defaults to `info`.
pub fn init_logs(format: LogFormat, sentry: Option<&Sentry>) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![match format {
        LogFormat::Logfmt => tracing_logfmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Terminal => tracing_subscriber::fmt::layer().boxed(),
    }];
    if let Some(sentry) = sentry {
        layers.push(sentry.layer().boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;
    Ok(())
}
