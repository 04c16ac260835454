//! Persistence contracts consumed by the auth core and the handlers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Organization, OrganizationChanges, Role, Task, TaskChanges, UserChanges, UserRecord,
};
use crate::services::ServiceError;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<UserRecord>, ServiceError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, ServiceError>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, ServiceError>;

    /// Fails with `Conflict` when the username is taken.
    async fn insert_user(&self, user: &UserRecord) -> Result<(), ServiceError>;

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: &UserChanges,
    ) -> Result<UserRecord, ServiceError>;

    async fn update_user_role(&self, user_id: Uuid, role: Role)
        -> Result<UserRecord, ServiceError>;

    async fn update_user_organization(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<UserRecord, ServiceError>;

    async fn find_users_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<UserRecord>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<(), ServiceError>;

    /// Soft-deleted tasks are not returned.
    async fn find_task_by_id(&self, task_id: Uuid) -> Result<Option<Task>, ServiceError>;

    /// Newest first.
    async fn find_tasks_by_user(&self, user_id: Uuid) -> Result<Vec<Task>, ServiceError>;

    async fn update_task(&self, task_id: Uuid, changes: &TaskChanges)
        -> Result<Task, ServiceError>;

    async fn set_task_completed(&self, task_id: Uuid, completed: bool)
        -> Result<Task, ServiceError>;

    async fn soft_delete_task(&self, task_id: Uuid) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), ServiceError>;

    /// Insert `organization` and move `owner_id` into it as `owner`, all or nothing.
    async fn create_organization_with_owner(
        &self,
        organization: &Organization,
        owner_id: Uuid,
    ) -> Result<UserRecord, ServiceError>;

    /// Soft-deleted organizations are not returned.
    async fn find_organization_by_id(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, ServiceError>;

    async fn update_organization(
        &self,
        organization_id: Uuid,
        changes: &OrganizationChanges,
    ) -> Result<Organization, ServiceError>;

    async fn soft_delete_organization(&self, organization_id: Uuid) -> Result<(), ServiceError>;
}

pub(crate) fn user_not_found() -> ServiceError {
    ServiceError::NotFound("User not found".to_string())
}

pub(crate) fn task_not_found() -> ServiceError {
    ServiceError::NotFound("Task not found".to_string())
}

pub(crate) fn organization_not_found() -> ServiceError {
    ServiceError::NotFound("Organization not found".to_string())
}
