use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::user::{CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest},
    middleware::AuthUser,
    models::{UserChanges, UserRecord},
    services::{metrics::record_auth_failure, store::user_not_found, AuthError, PasswordPolicy},
    utils::{generate_api_key, hash_password_blocking, Password, ValidatedJson},
    AppState,
};

/// Create an account with the `user` role. The response carries the new API key.
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.password.is_empty() {
        return Err(AuthError::EmptyPassword.into());
    }
    PasswordPolicy::validate_strength(&req.password)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.to_string())))?;

    if let Some(organization_id) = req.organization_id {
        if state
            .organizations
            .find_organization_by_id(organization_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(anyhow::anyhow!("Organization not found")));
        }
    }

    let password_hash =
        hash_password_blocking(Password::new(req.password), state.config.password).await?;
    let api_key = generate_api_key()?;

    let user = UserRecord::new(
        req.username,
        password_hash.into_string(),
        api_key,
        req.age,
        req.gender,
        req.organization_id,
    );
    state.users.insert_user(&user).await?;

    let user = state.users.find_user_by_id(user.id).await?.unwrap_or(user);
    tracing::info!(user_id = %user.id, username = %user.username, "User created");

    Ok((StatusCode::CREATED, Json(user.with_api_key())))
}

/// Exchange username and password for the account's API key.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // Passwords are hashed verbatim at creation, so only the username is trimmed
    let username = req.username.trim();
    if username.is_empty() || req.password.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Username and password are required"
        )));
    }

    let identity = state
        .identity
        .resolve_by_password(username, Password::new(req.password))
        .await
        .map_err(|e| {
            record_auth_failure(e.reason());
            tracing::warn!(reason = e.reason(), "Login failed");
            e
        })?;

    let user = state
        .users
        .find_user_by_id(identity.user_id)
        .await?
        .ok_or(AuthError::InvalidCredential)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        api_key: user.api_key.clone(),
        user: user.sanitized(),
    }))
}

pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_user_by_id(identity.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(user.sanitized()))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changes = UserChanges {
        username: req.username,
        age: req.age,
        gender: req.gender,
    };

    let user = state.users.update_user(identity.user_id, &changes).await?;
    tracing::info!(user_id = %user.id, "User profile updated");

    Ok(Json(user.sanitized()))
}
