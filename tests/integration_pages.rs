#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, unreachable_pub)]
use axum::http::StatusCode;
mod common;

#[tokio::test]
async fn test_home_page() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app.client.get(format!("{}/", app.api_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["title"], "Home");
    assert!(body["message"].as_str().unwrap().contains("Register"));
}

#[tokio::test]
async fn test_about_page() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app.client.get(format!("{}/about", app.api_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["title"], "About");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app.client.get(format!("{}/", app.api_url)).send().await.unwrap();

    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app.client.get(format!("{}/nope", app.api_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
