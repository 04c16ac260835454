//! In-process store used by tests and local runs without Postgres.

use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{organization_not_found, task_not_found, user_not_found};
use super::{OrganizationStore, ServiceError, TaskStore, UserStore};
use crate::models::{
    Organization, OrganizationChanges, Role, Task, TaskChanges, UserChanges, UserRecord,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    tasks: HashMap<Uuid, Task>,
    organizations: HashMap<Uuid, Organization>,
}

impl Inner {
    /// Fill the joined organization name the way the SQL projection does.
    fn project(&self, user: &UserRecord) -> UserRecord {
        let mut user = user.clone();
        user.organization_name = user
            .organization_id
            .and_then(|id| self.organizations.get(&id))
            .filter(|org| org.deleted_at.is_none())
            .map(|org| org.name.clone());
        user
    }

    fn live_task_mut(&mut self, task_id: Uuid) -> Result<&mut Task, ServiceError> {
        self.tasks
            .get_mut(&task_id)
            .filter(|t| t.deleted_at.is_none())
            .ok_or_else(task_not_found)
    }

    fn live_organization_mut(&mut self, id: Uuid) -> Result<&mut Organization, ServiceError> {
        self.organizations
            .get_mut(&id)
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(organization_not_found)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<UserRecord>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.api_key == api_key)
            .map(|u| inner.project(u)))
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| inner.project(u)))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).map(|u| inner.project(u)))
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), ServiceError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(ServiceError::Conflict("Username already exists".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: &UserChanges,
    ) -> Result<UserRecord, ServiceError> {
        let mut inner = self.inner.write().await;

        if let Some(username) = &changes.username {
            if inner
                .users
                .values()
                .any(|u| u.id != user_id && &u.username == username)
            {
                return Err(ServiceError::Conflict("Username already exists".to_string()));
            }
        }

        let user = inner.users.get_mut(&user_id).ok_or_else(user_not_found)?;
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(age) = changes.age {
            user.age = Some(age);
        }
        if let Some(gender) = &changes.gender {
            user.gender = Some(gender.clone());
        }
        user.updated_at = Utc::now();

        let user = user.clone();
        Ok(inner.project(&user))
    }

    async fn update_user_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<UserRecord, ServiceError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&user_id).ok_or_else(user_not_found)?;
        user.role = role.as_str().to_string();
        user.updated_at = Utc::now();

        let user = user.clone();
        Ok(inner.project(&user))
    }

    async fn update_user_organization(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<UserRecord, ServiceError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&user_id).ok_or_else(user_not_found)?;
        user.organization_id = organization_id;
        user.updated_at = Utc::now();

        let user = user.clone();
        Ok(inner.project(&user))
    }

    async fn find_users_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<UserRecord>, ServiceError> {
        let inner = self.inner.read().await;
        let mut users: Vec<UserRecord> = inner
            .users
            .values()
            .filter(|u| u.organization_id == Some(organization_id))
            .map(|u| inner.project(u))
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: &Task) -> Result<(), ServiceError> {
        self.inner.write().await.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_task_by_id(&self, task_id: Uuid) -> Result<Option<Task>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .get(&task_id)
            .filter(|t| t.deleted_at.is_none())
            .cloned())
    }

    async fn find_tasks_by_user(&self, user_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        changes: &TaskChanges,
    ) -> Result<Task, ServiceError> {
        let mut inner = self.inner.write().await;
        let task = inner.live_task_mut(task_id)?;
        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(description) = &changes.description {
            task.description = Some(description.clone());
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn set_task_completed(
        &self,
        task_id: Uuid,
        completed: bool,
    ) -> Result<Task, ServiceError> {
        let mut inner = self.inner.write().await;
        let task = inner.live_task_mut(task_id)?;
        if task.completed != completed {
            task.completed = completed;
            task.updated_at = Utc::now();
        }
        Ok(task.clone())
    }

    async fn soft_delete_task(&self, task_id: Uuid) -> Result<(), ServiceError> {
        let mut inner = self.inner.write().await;
        let task = inner.live_task_mut(task_id)?;
        task.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), ServiceError> {
        self.inner
            .write()
            .await
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }

    async fn create_organization_with_owner(
        &self,
        organization: &Organization,
        owner_id: Uuid,
    ) -> Result<UserRecord, ServiceError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&owner_id) {
            return Err(user_not_found());
        }
        inner
            .organizations
            .insert(organization.id, organization.clone());

        let user = inner.users.get_mut(&owner_id).ok_or_else(user_not_found)?;
        user.organization_id = Some(organization.id);
        user.role = Role::Owner.as_str().to_string();
        user.updated_at = Utc::now();

        let user = user.clone();
        Ok(inner.project(&user))
    }

    async fn find_organization_by_id(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .organizations
            .get(&organization_id)
            .filter(|o| o.deleted_at.is_none())
            .cloned())
    }

    async fn update_organization(
        &self,
        organization_id: Uuid,
        changes: &OrganizationChanges,
    ) -> Result<Organization, ServiceError> {
        let mut inner = self.inner.write().await;
        let organization = inner.live_organization_mut(organization_id)?;
        if let Some(name) = &changes.name {
            organization.name = name.clone();
        }
        if let Some(description) = &changes.description {
            organization.description = Some(description.clone());
        }
        organization.updated_at = Utc::now();
        Ok(organization.clone())
    }

    async fn soft_delete_organization(&self, organization_id: Uuid) -> Result<(), ServiceError> {
        let mut inner = self.inner.write().await;
        let organization = inner.live_organization_mut(organization_id)?;
        organization.deleted_at = Some(Utc::now());
        Ok(())
    }
}
