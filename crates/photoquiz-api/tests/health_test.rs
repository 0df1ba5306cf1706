//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use photoquiz_test_support::InMemorySituationStore;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let app = TestApp::new(InMemorySituationStore::new());

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["roundInProgress"], false);
    assert_eq!(json["sessionActive"], false);
}

#[tokio::test]
async fn test_health_reflects_game_activity() {
    let store = InMemorySituationStore::new();
    store.seed("a lighthouse", &["l0"]);
    let app = TestApp::new(store);
    app.post("/api/session/create", Some(serde_json::json!({ "players": ["Ann"] })))
        .await;
    app.post("/api/start", None).await;

    let (_, json) = app.get("/health").await;

    assert_eq!(json["roundInProgress"], true);
    assert_eq!(json["sessionActive"], true);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = TestApp::new(InMemorySituationStore::new());

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
