use crate::api::AppState;
use crate::error::Result;
use crate::metrics::{gather_metrics, SEARCH_REQUESTS_TOTAL, SEARCH_REQUEST_DURATION_SECONDS};
use crate::search::{FacetResponse, Page, RequestParams, SearchView};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::future::Future;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Prometheus exposition
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Autocomplete over names, addresses and topics
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Page<serde_json::Value>>> {
    list(&state, &state.views.autocomplete, params.into()).await
}

/// Topic-oriented credential search
pub async fn credentials(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Page<serde_json::Value>>> {
    list(&state, &state.views.credentials, params.into()).await
}

/// Credential facet counts with a page of results
pub async fn credential_facets(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<FacetResponse<serde_json::Value>>> {
    let params: RequestParams = params.into();
    let view = &state.views.credentials;
    let label = format!("{}_facets", view.name);

    observed(&label, state.service.facets(view, &params))
        .await
        .map(Json)
}

/// Topic search
pub async fn topics(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Page<serde_json::Value>>> {
    list(&state, &state.views.topics, params.into()).await
}

async fn list(
    state: &AppState,
    view: &SearchView,
    params: RequestParams,
) -> Result<Json<Page<serde_json::Value>>> {
    observed(view.name, state.service.list(view, &params))
        .await
        .map(Json)
}

/// Record duration and outcome of one search request
async fn observed<T, F>(view: &str, request: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let timer = SEARCH_REQUEST_DURATION_SECONDS
        .with_label_values(&[view])
        .start_timer();
    let result = request.await;
    timer.observe_duration();

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    SEARCH_REQUESTS_TOTAL
        .with_label_values(&[view, status.as_str()])
        .inc();

    result
}
