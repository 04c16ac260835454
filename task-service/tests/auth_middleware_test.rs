mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::spawn_app;
use task_service::models::Role;

fn me_with_authorization(value: &str) -> Request<Body> {
    Request::builder()
        .uri("/v1/users/me")
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let app = spawn_app();

    let (status, body) = app.get("/v1/users/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing authorization header");
}

#[tokio::test]
async fn test_blank_header_counts_as_missing() {
    let app = spawn_app();

    let (status, body) = app.send(me_with_authorization("   ")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing authorization header");
}

#[tokio::test]
async fn test_wrong_scheme_is_invalid_credentials() {
    let app = spawn_app();
    let user = app.seed_user("alice", Role::User).await;

    for value in [
        format!("Bearer {}", user.api_key),
        format!("apikey {}", user.api_key),
        format!("APIKEY{}", user.api_key),
        "APIKEY".to_string(),
        "APIKEY abc-def".to_string(),
    ] {
        let (status, body) = app.send(me_with_authorization(&value)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {value:?}");
        assert_eq!(body["error"], "invalid credentials");
    }
}

#[tokio::test]
async fn test_unknown_key_is_invalid_credentials() {
    let app = spawn_app();
    app.seed_user("alice", Role::User).await;

    let (status, body) = app.get("/v1/users/me", Some("deadbeef")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn test_valid_key_resolves_identity() {
    let app = spawn_app();
    let user = app.seed_user("alice", Role::Moderator).await;

    let (status, body) = app.get("/v1/users/me", Some(&user.api_key)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "moderator");
    assert!(body.get("api_key").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_surrounding_whitespace_is_tolerated() {
    let app = spawn_app();
    let user = app.seed_user("alice", Role::User).await;

    let (status, _) = app
        .send(me_with_authorization(&format!("  APIKEY   {}  ", user.api_key)))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_routes_skip_authentication() {
    let app = spawn_app();

    let (status, body) = app.get("/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = spawn_app();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/v1/healthz")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
