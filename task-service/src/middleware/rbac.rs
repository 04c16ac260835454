//! Route gates over the identity attached by the auth middleware.
//!
//! ```ignore
//! Router::new()
//!     .route("/admin/users/:user_id", get(get_user))
//!     .route_layer(from_fn_with_state(RequiredPermission(Permission::Admin), require_permission))
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use std::sync::Arc;

use super::RequestContext;
use crate::models::{Permission, Role};
use crate::services::{authz, metrics::record_auth_failure, AuthError};

#[derive(Debug, Clone)]
pub struct RequiredRoles(pub Arc<[Role]>);

impl RequiredRoles {
    pub fn new(roles: &[Role]) -> Self {
        Self(Arc::from(roles))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequiredPermission(pub Permission);

fn context_of(req: &Request) -> Result<&RequestContext, AuthError> {
    req.extensions()
        .get::<RequestContext>()
        .ok_or(AuthError::Unauthenticated)
}

fn denied(err: AuthError) -> AppError {
    record_auth_failure(err.reason());
    err.into()
}

pub async fn require_roles(
    State(RequiredRoles(roles)): State<RequiredRoles>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    {
        let identity = context_of(&req).and_then(RequestContext::identity).map_err(denied)?;
        authz::require_any_role(identity, &roles).map_err(|e| {
            tracing::warn!(user_id = %identity.user_id, role = %identity.role, "Role check failed");
            denied(e)
        })?;
    }

    Ok(next.run(req).await)
}

pub async fn require_permission(
    State(RequiredPermission(permission)): State<RequiredPermission>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    {
        let identity = context_of(&req).and_then(RequestContext::identity).map_err(denied)?;
        authz::require_permission(identity, permission).map_err(|e| {
            tracing::warn!(
                user_id = %identity.user_id,
                role = %identity.role,
                permission = %permission,
                "Permission check failed"
            );
            denied(e)
        })?;
    }

    Ok(next.run(req).await)
}
