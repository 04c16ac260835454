//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// The single projection every user query returns.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: Option<String>,
    pub api_key: String,
    pub role: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new account with the `user` role.
    pub fn new(
        username: String,
        password_hash: String,
        api_key: String,
        age: Option<i32>,
        gender: Option<String>,
        organization_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash: Some(password_hash),
            api_key,
            role: Role::User.as_str().to_string(),
            age,
            gender,
            organization_id,
            organization_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public view without the password hash or API key.
    pub fn sanitized(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
            age: self.age,
            gender: self.gender.clone(),
            organization_id: self.organization_id,
            organization_name: self.organization_name.clone(),
            api_key: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Public view including the API key, for the account owner only.
    pub fn with_api_key(&self) -> UserResponse {
        UserResponse {
            api_key: Some(self.api_key.clone()),
            ..self.sanitized()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = UserRecord::new(
            "alice".into(),
            "$argon2id$...".into(),
            "k".repeat(64),
            Some(30),
            None,
            None,
        );
        assert_eq!(user.role, "user");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_sanitized_hides_secrets() {
        let user = UserRecord::new("alice".into(), "hash".into(), "secretkey".into(), None, None, None);

        let json = serde_json::to_value(user.sanitized()).unwrap();
        assert!(json.get("api_key").is_none());
        assert!(json.get("password_hash").is_none());

        let json = serde_json::to_value(user.with_api_key()).unwrap();
        assert_eq!(json["api_key"], "secretkey");
    }
}
