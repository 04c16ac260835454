#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use std::net::SocketAddr;
use http_body_util::BodyExt;
use serde_json::Value;
use task_service::{
    build_router,
    config::TaskConfig,
    models::{Role, UserRecord},
    services::{MemoryStore, UserStore},
    utils::{generate_api_key, hash_password, Password, PasswordConfig},
    AppState,
};
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "Sup3r$ecret";

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

pub fn test_password_config() -> PasswordConfig {
    PasswordConfig {
        time_cost: 1,
        memory_cost_kib: 1024,
        parallelism: 1,
        key_length: 32,
    }
}

pub fn test_config() -> TaskConfig {
    let mut config = TaskConfig::default();
    config.password = test_password_config();
    config.rate_limit.login_attempts = 1000;
    config.rate_limit.global_ip_limit = 10_000;
    config
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: TaskConfig) -> TestApp {
    let store = MemoryStore::new();
    let state = AppState::new(config, store.clone()).expect("app state");
    TestApp {
        router: build_router(state),
        store,
    }
}

impl TestApp {
    /// Insert a user with [`TEST_PASSWORD`] and the given role; returns the stored record.
    pub async fn seed_user(&self, username: &str, role: Role) -> UserRecord {
        let hash = hash_password(
            &Password::new(TEST_PASSWORD),
            Some(&test_password_config()),
        )
        .expect("hash");
        let user = UserRecord::new(
            username.to_string(),
            hash.into_string(),
            generate_api_key().expect("api key"),
            None,
            None,
            None,
        );
        self.store.insert_user(&user).await.expect("insert user");
        self.store
            .update_user_role(user.id, role)
            .await
            .expect("set role")
    }

    /// Insert a user whose stored role string is not one of the known roles.
    pub async fn seed_user_with_raw_role(&self, username: &str, role: &str) -> UserRecord {
        let mut user = UserRecord::new(
            username.to_string(),
            "unused".to_string(),
            generate_api_key().expect("api key"),
            None,
            None,
            None,
        );
        user.role = role.to_string();
        self.store.insert_user(&user).await.expect("insert user");
        user
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, api_key: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, api_key, None)).await
    }

    pub async fn post(&self, uri: &str, api_key: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, api_key, Some(body)))
            .await
    }
}

pub fn request(
    method: Method,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header(header::AUTHORIZATION, format!("APIKEY {key}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Attach the peer address the server would record for a real connection.
pub fn from_peer(mut request: Request<Body>, ip: &str) -> Request<Body> {
    let addr = SocketAddr::new(ip.parse().expect("ip"), 50000);
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}
