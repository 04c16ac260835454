//! PostgreSQL implementation of the store traits.
//!
//! Tables `users`, `tasks` and `organizations` are provisioned outside this service.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use super::store::{organization_not_found, task_not_found, user_not_found};
use super::{OrganizationStore, ServiceError, TaskStore, UserStore};
use crate::config::DatabaseConfig;
use crate::models::{
    Organization, OrganizationChanges, Role, Task, TaskChanges, UserChanges, UserRecord,
};

const USER_PROJECTION: &str = r#"
    SELECT u.id, u.username, u.password_hash, u.api_key, u.role, u.age, u.gender,
           u.organization_id, o.name AS organization_name, u.created_at, u.updated_at
    FROM users u
    LEFT JOIN organizations o ON o.id = u.organization_id AND o.deleted_at IS NULL
"#;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, completed, created_at, updated_at, deleted_at";

const ORGANIZATION_COLUMNS: &str =
    "id, name, description, created_by, created_at, updated_at, deleted_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized and timed from `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self::new(pool))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn user_query(filter: &str) -> String {
        format!("{} WHERE {}", USER_PROJECTION, filter)
    }

    async fn require_user(&self, user_id: Uuid) -> Result<UserRecord, ServiceError> {
        self.find_user_by_id(user_id)
            .await?
            .ok_or_else(user_not_found)
    }
}

fn conflict_on_unique(err: sqlx::Error, message: &str) -> ServiceError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ServiceError::Conflict(message.to_string())
        }
        _ => ServiceError::Database(err),
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<UserRecord>, ServiceError> {
        let sql = Self::user_query("u.api_key = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, ServiceError> {
        let sql = Self::user_query("u.username = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, ServiceError> {
        let sql = Self::user_query("u.id = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, api_key, role, age, gender, organization_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.api_key)
        .bind(&user.role)
        .bind(user.age)
        .bind(&user.gender)
        .bind(user.organization_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Username already exists"))?;
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: &UserChanges,
    ) -> Result<UserRecord, ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                age = COALESCE($3, age),
                gender = COALESCE($4, gender),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&changes.username)
        .bind(changes.age)
        .bind(&changes.gender)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Username already exists"))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found());
        }
        self.require_user(user_id).await
    }

    async fn update_user_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<UserRecord, ServiceError> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found());
        }
        self.require_user(user_id).await
    }

    async fn update_user_organization(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<UserRecord, ServiceError> {
        let result = sqlx::query(
            "UPDATE users SET organization_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found());
        }
        self.require_user(user_id).await
    }

    async fn find_users_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<UserRecord>, ServiceError> {
        let sql = Self::user_query("u.organization_id = $1 ORDER BY u.username");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                ServiceError::Database(e)
            })
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn insert_task(&self, task: &Task) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, title, description, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_task_by_id(&self, task_id: Uuid) -> Result<Option<Task>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_tasks_by_user(&self, user_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        changes: &TaskChanges,
    ) -> Result<Task, ServiceError> {
        let sql = format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(task_not_found)
    }

    async fn set_task_completed(
        &self,
        task_id: Uuid,
        completed: bool,
    ) -> Result<Task, ServiceError> {
        // updated_at only moves when the state actually changes
        let sql = format!(
            r#"
            UPDATE tasks
            SET updated_at = CASE WHEN completed = $2 THEN updated_at ELSE NOW() END,
                completed = $2
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(completed)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(task_not_found)
    }

    async fn soft_delete_task(&self, task_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(task_not_found());
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for Database {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, description, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.description)
        .bind(organization.created_by)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Organization already exists"))?;
        Ok(())
    }

    async fn create_organization_with_owner(
        &self,
        organization: &Organization,
        owner_id: Uuid,
    ) -> Result<UserRecord, ServiceError> {
        // Dropping `tx` on an early return rolls back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, description, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.description)
        .bind(organization.created_by)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Organization already exists"))?;

        let result = sqlx::query(
            "UPDATE users SET organization_id = $2, role = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(owner_id)
        .bind(organization.id)
        .bind(Role::Owner.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found());
        }

        tx.commit().await?;
        self.require_user(owner_id).await
    }

    async fn find_organization_by_id(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM organizations WHERE id = $1 AND deleted_at IS NULL",
            ORGANIZATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Organization>(&sql)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_organization(
        &self,
        organization_id: Uuid,
        changes: &OrganizationChanges,
    ) -> Result<Organization, ServiceError> {
        let sql = format!(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            ORGANIZATION_COLUMNS
        );
        sqlx::query_as::<_, Organization>(&sql)
            .bind(organization_id)
            .bind(&changes.name)
            .bind(&changes.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Organization already exists"))?
            .ok_or_else(organization_not_found)
    }

    async fn soft_delete_organization(&self, organization_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE organizations SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(organization_not_found());
        }
        Ok(())
    }
}
