use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::admin::UpdateRoleRequest,
    middleware::AuthUser,
    models::Role,
    services::store::user_not_found,
    AppState,
};

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid user ID")))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(user.sanitized()))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let role: Role = req.role.trim().parse().map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid role: must be one of user, moderator, admin, owner"
        ))
    })?;

    let user = state.users.update_user_role(user_id, role).await?;
    tracing::info!(user_id = %user.id, role = %role, changed_by = %admin.user_id, "User role changed");

    Ok(Json(user.sanitized()))
}
