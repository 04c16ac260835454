use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::organization::{
        normalize_organization_name, CreateOrganizationRequest, UpdateOrganizationRequest,
    },
    middleware::AuthUser,
    models::{Identity, Organization, OrganizationChanges, Role, UserResponse},
    services::{authz, store::organization_not_found},
    utils::ValidatedJson,
    AppState,
};

fn parse_organization_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid organization ID")))
}

fn is_member(identity: &Identity, organization_id: Uuid) -> bool {
    identity.organization_id == Some(organization_id)
}

/// Members may read their organization; admins and owners may read any.
fn ensure_can_view(identity: &Identity, organization_id: Uuid) -> Result<(), AppError> {
    if is_member(identity, organization_id)
        || authz::require_any_role(identity, &[Role::Admin]).is_ok()
    {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!("Access denied")))
    }
}

/// Role gates run in the router; changes are further limited to the caller's own organization.
fn ensure_member(identity: &Identity, organization_id: Uuid) -> Result<(), AppError> {
    if is_member(identity, organization_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!("Access denied")))
    }
}

async fn load_organization(state: &AppState, organization_id: Uuid) -> Result<Organization, AppError> {
    Ok(state
        .organizations
        .find_organization_by_id(organization_id)
        .await?
        .ok_or_else(organization_not_found)?)
}

/// Create an organization. The creator joins it and becomes its `owner`.
pub async fn create_organization(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = normalize_organization_name(&req.name)
        .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?;

    let organization = Organization::new(name, req.description, identity.user_id);
    state
        .organizations
        .create_organization_with_owner(&organization, identity.user_id)
        .await?;

    tracing::info!(
        organization_id = %organization.id,
        user_id = %identity.user_id,
        previous_role = %identity.role,
        "Organization created; creator promoted to owner"
    );

    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn get_organization(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(organization_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_organization_id(&organization_id)?;
    ensure_can_view(&identity, organization_id)?;

    Ok(Json(load_organization(&state, organization_id).await?))
}

pub async fn list_organization_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(organization_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_organization_id(&organization_id)?;
    ensure_can_view(&identity, organization_id)?;
    load_organization(&state, organization_id).await?;

    let users: Vec<UserResponse> = state
        .users
        .find_users_by_organization(organization_id)
        .await?
        .iter()
        .map(|u| u.sanitized())
        .collect();

    Ok(Json(users))
}

pub async fn update_organization(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(organization_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_organization_id(&organization_id)?;
    ensure_member(&identity, organization_id)?;

    let name = req
        .name
        .as_deref()
        .map(normalize_organization_name)
        .transpose()
        .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?;

    let changes = OrganizationChanges {
        name,
        description: req.description,
    };
    let organization = state
        .organizations
        .update_organization(organization_id, &changes)
        .await?;

    tracing::info!(organization_id = %organization.id, user_id = %identity.user_id, "Organization updated");
    Ok(Json(organization))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(organization_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_organization_id(&organization_id)?;
    ensure_member(&identity, organization_id)?;

    state
        .organizations
        .soft_delete_organization(organization_id)
        .await?;

    tracing::info!(organization_id = %organization_id, user_id = %identity.user_id, "Organization deleted");
    Ok(StatusCode::NO_CONTENT)
}
