use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use service_core::middleware::RequestId;

use super::RequestContext;
use crate::{
    models::Identity,
    services::{metrics::record_auth_failure, AuthError},
    utils::extract_api_key,
    AppState,
};

/// Middleware to require an API key: extract, resolve, attach.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let extracted = extract_api_key(req.headers());
    let resolved = match extracted {
        Ok(raw_key) => state.identity.resolve_by_api_key(&raw_key).await,
        Err(e) => Err(e),
    };

    let identity = match resolved {
        Ok(identity) => identity,
        Err(e) => {
            record_auth_failure(e.reason());
            tracing::warn!(reason = e.reason(), path = %req.uri().path(), "Authentication failed");
            return Err(e.into());
        }
    };

    tracing::debug!(user_id = %identity.user_id, role = %identity.role, "Request authenticated");

    let context = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| {
            RequestContext::new(req.extensions().get::<RequestId>().map(|id| id.0.clone()))
        });
    req.extensions_mut().insert(context.with_identity(identity));

    Ok(next.run(req).await)
}

/// Extractor for the identity attached by [`auth_middleware`].
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<RequestContext>()
            .ok_or(AuthError::Unauthenticated)?;

        Ok(AuthUser(context.identity()?.clone()))
    }
}
