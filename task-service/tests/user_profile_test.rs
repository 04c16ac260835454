mod common;

use axum::http::{Method, StatusCode};
use common::{request, spawn_app, TEST_PASSWORD};
use serde_json::json;
use task_service::models::Role;

#[tokio::test]
async fn test_update_profile_fields() {
    let app = spawn_app();
    let user = app.seed_user("alice", Role::User).await;

    let (status, body) = app
        .send(request(
            Method::PATCH,
            "/v1/users/me",
            Some(&user.api_key),
            Some(json!({ "age": 31, "gender": "prefer_not_to_say" })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["age"], 31);
    assert_eq!(body["gender"], "prefer_not_to_say");
}

#[tokio::test]
async fn test_rename_keeps_api_key_and_password() {
    let app = spawn_app();
    let user = app.seed_user("alice", Role::User).await;

    let (status, body) = app
        .send(request(
            Method::PATCH,
            "/v1/users/me",
            Some(&user.api_key),
            Some(json!({ "username": "alice_b" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice_b");

    let (status, _) = app.get("/v1/users/me", Some(&user.api_key)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, login) = app
        .post(
            "/v1/login",
            None,
            json!({ "username": "alice_b", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["api_key"], user.api_key);
}

#[tokio::test]
async fn test_rename_to_taken_username_conflicts() {
    let app = spawn_app();
    let alice = app.seed_user("alice", Role::User).await;
    app.seed_user("bob", Role::User).await;

    let (status, _) = app
        .send(request(
            Method::PATCH,
            "/v1/users/me",
            Some(&alice.api_key),
            Some(json!({ "username": "bob" })),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_profile_update() {
    let app = spawn_app();
    let user = app.seed_user("alice", Role::User).await;

    for payload in [
        json!({ "age": 200 }),
        json!({ "gender": "unknown" }),
        json!({ "username": "_alice" }),
    ] {
        let (status, _) = app
            .send(request(
                Method::PATCH,
                "/v1/users/me",
                Some(&user.api_key),
                Some(payload.clone()),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload}");
    }
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    let app = spawn_app();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .uri("/metrics")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
