//! HTTP surface tests driven through the router with `oneshot`

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use vcr_search::api::{build_router, AppState};
use vcr_search::error::MISSING_TOPIC_PARAMETERS;

async fn app() -> Router {
    vcr_search::metrics::init_metrics().unwrap();
    let service = common::seeded_service().await;
    build_router(AppState::new(Arc::new(service)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app().await, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_credential_search() {
    let (status, body) = get(app().await, "/search/credentials?name=alpha").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 1);
    assert_eq!(body["first_index"], 1);
    assert_eq!(body["last_index"], 5);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_credential_search_short_name() {
    let (status, body) = get(app().await, "/search/credentials?name=al").await;

    // "Al's ..." names, the revoked c6 has none
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_credential_search_without_criteria() {
    let (status, body) = get(app().await, "/search/credentials").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], MISSING_TOPIC_PARAMETERS);
    assert_eq!(body["error"]["status"], 400);
}

#[tokio::test]
async fn test_repeated_parameters_are_kept() {
    let (status, body) = get(
        app().await,
        "/search/credentials?name=alpha&category=entity_type::A&category=entity_type::B",
    )
    .await;

    // both categories must hold, no credential has both
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_invalid_page() {
    let (status, body) = get(app().await, "/search/credentials?name=alpha&page=9").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Invalid page.");
}

#[tokio::test]
async fn test_facets() {
    let (status, body) = get(
        app().await,
        "/search/credentials/facets?name=alpha&category=entity_type::A",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["facets"].is_object());
    assert_eq!(body["objects"]["total"], 2);

    let categories = body["facets"]["category"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["value"], "entity_type::A");
    assert_eq!(categories[0]["count"], 2);
}

#[tokio::test]
async fn test_autocomplete() {
    let (status, body) = get(app().await, "/search/autocomplete?q=alpha").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    for result in body["results"].as_array().unwrap() {
        assert_eq!(result["type"], "name");
        assert!(result["topic_id"].is_string());
    }
}

#[tokio::test]
async fn test_topics() {
    let (status, body) = get(app().await, "/search/topics?name=alpha&page_size=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["next"], 2);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let app = app().await;
    let (status, _) = get(app.clone(), "/search/topics?name=alpha").await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("vcr_search_search_requests_total"));
}
