//! HTTP front end of the on-demand mode.
//!
//! Each `/root_end` request registers a waiter for its hash and seeds the detail stage; the
//! root-anchor stage answers it through the response router.
mod handlers;
mod metrics;
mod models;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use finality_scraper_explorer::Explorer;
use finality_scraper_pipeline::Pipeline;
use finality_scraper_stages::{
    AnchorCache, AnchorStage, CompletionSink, DetailRequest, DetailStage, ResponseRouter,
    ResponseSink, Tracked, WorkTracker,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

pub use models::{ErrorResponse, HealthResponse, RootEndResponse};

/// Requests that may wait for the detail stage at once.
const REQUEST_QUEUE_SIZE: usize = 256;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    requests: mpsc::Sender<Tracked<DetailRequest>>,
    router: Arc<ResponseRouter>,
    tracker: WorkTracker,
    request_timeout: Duration,
}

impl AppState {
    /// Spawns the detail and root-anchor stages into `tasks` and returns the state feeding
    /// them.
    pub fn start(explorer: Explorer, request_timeout: Duration, tasks: &mut JoinSet<()>) -> Self {
        let router = Arc::new(ResponseRouter::default());
        let sink: Arc<dyn CompletionSink> = Arc::new(ResponseSink::new(router.clone()));
        let tracker = WorkTracker::new();
        let (requests, receiver) = mpsc::channel(REQUEST_QUEUE_SIZE);

        Pipeline::from_receiver(receiver)
            .pipe(DetailStage {
                explorer: explorer.clone(),
                sink: sink.clone(),
                tracker: tracker.clone(),
            })
            .pipe(AnchorStage {
                explorer,
                cache: Arc::new(AnchorCache::evicting_failures()),
                sink,
                tracker: tracker.clone(),
            })
            .spawn(tasks);

        Self {
            requests,
            router,
            tracker,
            request_timeout,
        }
    }

    /// Requests still waiting for a result.
    pub fn pending_requests(&self) -> usize {
        self.router.pending()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/root_end", get(handlers::root_end))
        .with_state(state)
}

/// Serves the on-demand API until `stop` is cancelled.
pub async fn run_server(
    config: &ServerConfig,
    explorer: Explorer,
    stop: CancellationToken,
) -> anyhow::Result<()> {
    let mut tasks = JoinSet::new();
    let state = AppState::start(explorer, config.request_timeout, &mut tasks);
    let app = router(state);

    let listener = TcpListener::bind(&config.address).await?;
    tracing::info!("starting finality server on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await?;
    tracing::info!("finality server stopped");

    tasks.shutdown().await;
    Ok(())
}
