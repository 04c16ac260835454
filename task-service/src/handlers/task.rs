//! Task handlers. Tasks are private to their creator; deletion is also open to any role
//! holding the `delete` permission.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::task::{CreateTaskRequest, SearchParams, ToggleCompletionRequest, UpdateTaskRequest},
    middleware::AuthUser,
    models::{Identity, Permission, Task, TaskChanges},
    services::{authz, store::task_not_found},
    utils::ValidatedJson,
    AppState,
};

fn parse_task_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid task ID")))
}

fn access_denied() -> AppError {
    AppError::Forbidden(anyhow::anyhow!("Access denied"))
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

async fn load_task(state: &AppState, task_id: Uuid) -> Result<Task, AppError> {
    Ok(state
        .tasks
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(task_not_found)?)
}

/// Load a task the caller owns.
async fn load_owned_task(
    state: &AppState,
    identity: &Identity,
    task_id: Uuid,
) -> Result<Task, AppError> {
    let task = load_task(state, task_id).await?;
    if task.user_id != identity.user_id {
        tracing::warn!(task_id = %task_id, user_id = %identity.user_id, "Task access denied");
        return Err(access_denied());
    }
    Ok(task)
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task = Task::new(
        identity.user_id,
        req.title.trim().to_string(),
        normalize_description(req.description),
    );
    state.tasks.insert_task(&task).await?;

    tracing::info!(task_id = %task.id, user_id = %identity.user_id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tasks = state.tasks.find_tasks_by_user(identity.user_id).await?;
    Ok(Json(tasks))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.query.trim();
    let tasks: Vec<Task> = state
        .tasks
        .find_tasks_by_user(identity.user_id)
        .await?
        .into_iter()
        .filter(|task| query.is_empty() || task.matches(query))
        .take(params.effective_limit())
        .collect();

    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = load_owned_task(&state, &identity, task_id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(task_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = load_owned_task(&state, &identity, task_id).await?;

    let changes = TaskChanges {
        title: Some(req.title.trim().to_string()),
        description: normalize_description(req.description),
    };
    let mut updated = state.tasks.update_task(task.id, &changes).await?;

    if let Some(completed) = req.is_completed {
        updated = state.tasks.set_task_completed(task.id, completed).await?;
    }

    tracing::info!(task_id = %task.id, "Task updated");
    Ok(Json(updated))
}

pub async fn toggle_completion(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(task_id): Path<String>,
    Json(req): Json<ToggleCompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = load_owned_task(&state, &identity, task_id).await?;

    if task.completed == req.is_completed {
        return Ok(Json(task));
    }

    let updated = state
        .tasks
        .set_task_completed(task.id, req.is_completed)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = load_task(&state, task_id).await?;

    let is_owner = task.user_id == identity.user_id;
    if !is_owner && authz::require_permission(&identity, Permission::Delete).is_err() {
        tracing::warn!(task_id = %task.id, user_id = %identity.user_id, "Task delete denied");
        return Err(access_denied());
    }

    state.tasks.soft_delete_task(task.id).await?;
    tracing::info!(task_id = %task.id, deleted_by = %identity.user_id, owner = is_owner, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
