pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    create_ip_rate_limiter, ip_rate_limit_middleware, metrics_middleware,
    request_id_middleware, security_headers_middleware, IpRateLimiter, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::TaskConfig;
use crate::middleware::{RequiredPermission, RequiredRoles};
use crate::models::{Permission, Role};
use crate::services::{IdentityResolver, OrganizationStore, TaskStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: TaskConfig,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub identity: IdentityResolver,
    pub login_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire one store behind all three persistence contracts.
    pub fn new<S>(config: TaskConfig, store: S) -> Result<Self, AppError>
    where
        S: UserStore + TaskStore + OrganizationStore + 'static,
    {
        let store = Arc::new(store);
        let users: Arc<dyn UserStore> = store.clone();

        let identity = IdentityResolver::new(users.clone(), &config.password)?;

        let trust_forwarded_for = config.rate_limit.trust_forwarded_for;
        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        )
        .trusting_forwarded_for(trust_forwarded_for);
        let ip_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        )
        .trusting_forwarded_for(trust_forwarded_for);

        Ok(Self {
            tasks: store.clone(),
            organizations: store,
            users,
            identity,
            login_rate_limiter,
            ip_rate_limiter,
            config,
        })
    }

    pub fn rate_limiters(&self) -> Vec<IpRateLimiter> {
        vec![
            self.login_rate_limiter.clone(),
            self.ip_rate_limiter.clone(),
        ]
    }
}

fn task_routes() -> Router<AppState> {
    use handlers::task;

    Router::new()
        .route("/tasks", post(task::create_task).get(task::list_tasks))
        .route("/tasks/search", get(task::search_tasks))
        .route(
            "/tasks/:task_id",
            get(task::get_task)
                .put(task::update_task)
                .delete(task::delete_task),
        )
        .route("/tasks/:task_id/completion", patch(task::toggle_completion))
        .route_layer(from_fn_with_state(
            RequiredPermission(Permission::Read),
            middleware::require_permission,
        ))
}

fn organization_routes() -> Router<AppState> {
    use handlers::organization as org;

    Router::new()
        .route("/organizations", post(org::create_organization))
        .route(
            "/organizations/:org_id",
            get(org::get_organization)
                .merge(patch(org::update_organization).route_layer(from_fn_with_state(
                    RequiredRoles::new(&[Role::Admin]),
                    middleware::require_roles,
                )))
                .merge(delete(org::delete_organization).route_layer(from_fn_with_state(
                    RequiredRoles::new(&[Role::Owner]),
                    middleware::require_roles,
                ))),
        )
        .route(
            "/organizations/:org_id/users",
            get(org::list_organization_users),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users/:user_id", get(handlers::admin::get_user))
        .route(
            "/admin/users/:user_id/role",
            put(handlers::admin::update_user_role),
        )
        .route_layer(from_fn_with_state(
            RequiredPermission(Permission::Admin),
            middleware::require_permission,
        ))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/login", post(handlers::user::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let authenticated = Router::new()
        .route(
            "/users/me",
            get(handlers::user::get_me).patch(handlers::user::update_me),
        )
        .merge(task_routes())
        .merge(organization_routes())
        .merge(admin_routes())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let v1 = Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/users", post(handlers::user::create_user))
        .merge(login_route)
        .merge(authenticated);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .nest("/v1", v1)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

/// Readiness check: reports unhealthy when the user store cannot be reached.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        }
    })))
}
