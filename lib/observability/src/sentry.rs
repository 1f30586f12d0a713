use std::{borrow::Cow, sync::Arc};

use sentry::{
    ClientInitGuard,
    protocol::{Event, Exception, Values},
    types::Dsn,
};
use tracing_subscriber::{Layer, registry::LookupSpan};

/// Forwards warnings and errors to Sentry.
#[derive(Debug)]
pub struct Sentry {
    dsn: Dsn,
    release: Option<String>,
    mode: Option<String>,
}

impl Sentry {
    pub fn new(url: &str) -> Result<Self, sentry::types::ParseDsnError> {
        Ok(Self {
            dsn: url.parse()?,
            release: None,
            mode: None,
        })
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    /// Tags every event with the mode the process runs in.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn layer<S>(&self) -> impl Layer<S> + Send + Sync + 'static
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        use sentry::integrations::tracing::EventFilter;

        sentry::integrations::tracing::layer()
            .event_filter(|metadata| match *metadata.level() {
                tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
                _ => EventFilter::Ignore,
            })
            .span_filter(|metadata| {
                matches!(
                    *metadata.level(),
                    tracing::Level::ERROR | tracing::Level::WARN
                )
            })
    }

    /// Starts the client. Reporting stops when the returned guard is dropped.
    pub fn install(self) -> ClientInitGuard {
        let mode = self.mode;
        let options = sentry::ClientOptions {
            release: self.release.map(Cow::from),
            attach_stacktrace: true,
            before_send: Some(Arc::new(move |mut event: Event<'static>| {
                if let Some(mode) = &mode {
                    event.tags.insert("mode".to_owned(), mode.clone());
                }
                // Events raised from `tracing` carry only a message.
                if event.exception.is_empty() {
                    event.exception = Values::from(vec![Exception {
                        ty: event.level.to_string(),
                        value: event.message.clone(),
                        ..Default::default()
                    }]);
                }
                Some(event)
            })),
            ..Default::default()
        };

        sentry::init((self.dsn, options))
    }
}
