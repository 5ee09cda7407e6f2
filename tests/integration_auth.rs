#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, unreachable_pub)]
use axum::http::StatusCode;
use fugue_server::services::auth_service::AuthService;
use serde_json::json;
use uuid::Uuid;
mod common;

fn registration(username: &str, email: &str, password: &str, confirm: &str) -> serde_json::Value {
    json!({ "username": username, "email": email, "password": password, "confirmPassword": confirm })
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app
        .client
        .post(format!("{}/auth/register", app.api_url))
        .json(&registration("alice", "alice@example.com", "password123", "password124"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Passwords must match");
}

#[tokio::test]
async fn test_register_rejects_invalid_fields() {
    let app = common::TestApp::spawn_degraded().await;

    let cases = [
        registration("al", "alice@example.com", "password123", "password123"),
        registration("alice", "not-an-email", "password123", "password123"),
        registration("alice", "alice@example.com", "short", "short"),
    ];

    for case in cases {
        let resp = app.client.post(format!("{}/auth/register", app.api_url)).json(&case).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "accepted {case}");
    }
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app
        .client
        .post(format!("{}/auth/login", app.api_url))
        .json(&json!({ "email": "  ", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_without_token_is_unauthorized() {
    let app = common::TestApp::spawn_degraded().await;

    let resp = app.client.post(format!("{}/auth/logout", app.api_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_garbage_token_is_unauthorized() {
    let app = common::TestApp::spawn_degraded().await;

    let resp =
        app.client.post(format!("{}/auth/logout", app.api_url)).bearer_auth("not.a.token").send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_token_signed_by_other_secret_is_unauthorized() {
    let app = common::TestApp::spawn_degraded().await;
    let mut auth = app.config.auth.clone();
    auth.jwt_secret = "another_secret".to_string();
    let session = AuthService::new(auth).create_session(Uuid::new_v4()).unwrap();

    let resp =
        app.client.post(format!("{}/auth/logout", app.api_url)).bearer_auth(&session.token).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_valid_token() {
    let app = common::TestApp::spawn_degraded().await;
    let session = AuthService::new(app.config.auth.clone()).create_session(Uuid::new_v4()).unwrap();

    let resp =
        app.client.post(format!("{}/auth/logout", app.api_url)).bearer_auth(&session.token).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_register_login_logout_flow() {
    let app = common::TestApp::spawn().await;
    let (_, email, password) = app.register_user().await;

    let resp = app
        .client
        .post(format!("{}/auth/login", app.api_url))
        .json(&json!({ "email": email.to_uppercase(), "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(body["expiresAt"].as_u64().unwrap() > 0);

    let resp = app.client.post(format!("{}/auth/logout", app.api_url)).bearer_auth(token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_register_returns_public_fields() {
    let app = common::TestApp::spawn().await;
    let suffix = &Uuid::new_v4().simple().to_string()[..12];
    let username = format!("fresh_{suffix}");

    let resp = app
        .client
        .post(format!("{}/auth/register", app.api_url))
        .json(&registration(&username, &format!("  {username}@Example.com "), "password123", "password123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["username"], username);
    assert_eq!(body["email"], format!("{username}@example.com"));
    assert!(body["id"].as_str().unwrap().parse::<Uuid>().is_ok());
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_register_duplicate_username_conflicts() {
    let app = common::TestApp::spawn().await;
    let (username, _, _) = app.register_user().await;

    let resp = app
        .client
        .post(format!("{}/auth/register", app.api_url))
        .json(&registration(&username, "someone.else@example.com", "password123", "password123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("username"));
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_register_duplicate_email_conflicts() {
    let app = common::TestApp::spawn().await;
    let (_, email, _) = app.register_user().await;
    let suffix = &Uuid::new_v4().simple().to_string()[..12];

    let resp = app
        .client
        .post(format!("{}/auth/register", app.api_url))
        .json(&registration(&format!("other_{suffix}"), &email, "password123", "password123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_login_wrong_password_is_unauthorized() {
    let app = common::TestApp::spawn().await;
    let (_, email, _) = app.register_user().await;

    let resp = app
        .client
        .post(format!("{}/auth/login", app.api_url))
        .json(&json!({ "email": email, "password": "definitely wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_login_unknown_email_is_unauthorized() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .post(format!("{}/auth/login", app.api_url))
        .json(&json!({ "email": format!("{}@example.com", Uuid::new_v4()), "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
