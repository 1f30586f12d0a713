use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use finality_scraper_explorer::ScrapeError;
use finality_scraper_stages::DetailRequest;
use finality_scraper_types::{ChainId, TransactionHash, UnknownChain};

use super::AppState;
use super::metrics::SERVER_METRICS;
use super::models::{ErrorResponse, HealthResponse, RootEndQuery, RootEndResponse};

pub(super) async fn index() -> Html<&'static str> {
    Html("Hello from the finality scraper!")
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_owned(),
    })
}

pub(super) async fn root_end(
    State(state): State<AppState>,
    Query(query): Query<RootEndQuery>,
) -> Response {
    let latency = SERVER_METRICS.request_latency.start();
    let response = match resolve_root_end(&state, query).await {
        Ok(root_end) => (
            StatusCode::OK,
            Json(RootEndResponse {
                root_end: root_end.to_string(),
            }),
        )
            .into_response(),
        Err((status, err)) => error_response(status, err),
    };
    latency.observe();
    response
}

async fn resolve_root_end(
    state: &AppState,
    query: RootEndQuery,
) -> Result<i64, (StatusCode, String)> {
    let from_chain = query
        .from_chain
        .ok_or((StatusCode::BAD_REQUEST, "missing `from_chain` parameter".to_owned()))?;
    let chain: ChainId = from_chain
        .parse()
        .map_err(|err: UnknownChain| (StatusCode::BAD_REQUEST, err.to_string()))?;
    let hash = query
        .hash
        .filter(|hash| !hash.is_empty())
        .map(TransactionHash::from)
        .ok_or((StatusCode::BAD_REQUEST, "missing `hash` parameter".to_owned()))?;

    let registration = state.router.register(hash.clone());
    if registration.first {
        let request = state.tracker.track_item(DetailRequest {
            chain,
            hash: hash.clone(),
        });
        if state.requests.send(request).await.is_err() {
            state.router.resolve(&hash, Err(ScrapeError::Cancelled));
        }
    } else {
        tracing::debug!(%hash, "joining pending request");
    }

    match tokio::time::timeout(state.request_timeout, registration.receiver).await {
        Ok(Ok(Ok(root_end))) => Ok(root_end),
        Ok(Ok(Err(err))) => Err((status_of(&err), err.to_string())),
        Ok(Err(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "pipeline is not running".to_owned(),
        )),
        Err(_) => Err((
            StatusCode::GATEWAY_TIMEOUT,
            format!("no result for {hash} in time"),
        )),
    }
}

pub(super) fn status_of(err: &ScrapeError) -> StatusCode {
    match err {
        ScrapeError::SelectorMiss { .. }
        | ScrapeError::AttributeMissing { .. }
        | ScrapeError::Timestamp(_)
        | ScrapeError::InvalidUrl(_) => StatusCode::NOT_FOUND,
        ScrapeError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        ScrapeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ScrapeError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ScrapeError::InvalidSelector(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, err: String) -> Response {
    SERVER_METRICS.errors[&status.canonical_reason().unwrap_or("unknown")].inc();
    (status, Json(ErrorResponse { err })).into_response()
}
