//! Credential to identity resolution.

use std::sync::Arc;

use crate::models::Identity;
use crate::services::{AuthError, UserStore};
use crate::utils::{
    generate_api_key, hash_password, verify_password_blocking, Password, PasswordConfig,
    PasswordHashString,
};

/// Maps an API key or a username and password to the caller's [`Identity`].
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
    // Verified against when the username is unknown so both failure paths cost one Argon2 run
    dummy_hash: PasswordHashString,
}

impl IdentityResolver {
    /// Fails with `CryptoFailure` when the OS cannot supply randomness.
    pub fn new(users: Arc<dyn UserStore>, config: &PasswordConfig) -> Result<Self, AuthError> {
        let dummy_hash = hash_password(&Password::new(generate_api_key()?), Some(config))?;
        Ok(Self { users, dummy_hash })
    }

    pub async fn resolve_by_api_key(&self, raw_key: &str) -> Result<Identity, AuthError> {
        let user = self.users.find_user_by_api_key(raw_key).await?;

        match user {
            Some(user) => Ok(Identity::from(&user)),
            None => {
                tracing::debug!("No account for presented API key");
                Err(AuthError::InvalidCredential)
            }
        }
    }

    /// Unknown user, missing hash, wrong password and an unreadable stored hash all yield
    /// `InvalidCredential`.
    pub async fn resolve_by_password(
        &self,
        username: &str,
        password: Password,
    ) -> Result<Identity, AuthError> {
        let user = self.users.find_user_by_username(username).await?;

        let (user, stored_hash) = match user {
            Some(user) => match user.password_hash.clone() {
                Some(hash) => (user, PasswordHashString::new(hash)),
                None => {
                    tracing::info!(user_id = %user.id, "Password login for account without password");
                    self.burn(password).await;
                    return Err(AuthError::InvalidCredential);
                }
            },
            None => {
                self.burn(password).await;
                return Err(AuthError::InvalidCredential);
            }
        };

        match verify_password_blocking(password, stored_hash).await {
            Ok(true) => Ok(Identity::from(&user)),
            Ok(false) => Err(AuthError::InvalidCredential),
            Err(AuthError::Internal(e)) => Err(AuthError::Internal(e)),
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                Err(AuthError::InvalidCredential)
            }
        }
    }

    async fn burn(&self, password: Password) {
        let _ = verify_password_blocking(password, self.dummy_hash.clone()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::services::MemoryStore;
    use crate::utils::hash_password;

    fn light() -> PasswordConfig {
        PasswordConfig {
            time_cost: 1,
            memory_cost_kib: 1024,
            parallelism: 1,
            key_length: 32,
        }
    }

    async fn setup() -> (IdentityResolver, UserRecord) {
        let store = MemoryStore::new();
        let hash = hash_password(&Password::new("Abc12345!"), Some(&light())).unwrap();
        let user = UserRecord::new(
            "alice".into(),
            hash.into_string(),
            "abc123".into(),
            None,
            None,
            None,
        );
        store.insert_user(&user).await.unwrap();

        let resolver = IdentityResolver::new(Arc::new(store), &light()).unwrap();
        (resolver, user)
    }

    #[tokio::test]
    async fn test_resolve_by_api_key() {
        let (resolver, user) = setup().await;

        let identity = resolver.resolve_by_api_key("abc123").await.unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.role, "user");

        assert!(matches!(
            resolver.resolve_by_api_key("nope").await,
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_resolve_by_password() {
        let (resolver, user) = setup().await;

        let identity = resolver
            .resolve_by_password("alice", Password::new("Abc12345!"))
            .await
            .unwrap();
        assert_eq!(identity.user_id, user.id);
    }

    #[tokio::test]
    async fn test_ghost_user_and_wrong_password_are_indistinguishable() {
        let (resolver, _) = setup().await;

        let ghost = resolver
            .resolve_by_password("ghost", Password::new("Abc12345!"))
            .await
            .unwrap_err();
        let wrong = resolver
            .resolve_by_password("alice", Password::new("wrong"))
            .await
            .unwrap_err();

        assert!(matches!(ghost, AuthError::InvalidCredential));
        assert!(matches!(wrong, AuthError::InvalidCredential));
        assert_eq!(ghost.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_invalid_credential() {
        let store = MemoryStore::new();
        let user = UserRecord::new(
            "bob".into(),
            "$argon2id$garbage".into(),
            "key1".into(),
            None,
            None,
            None,
        );
        store.insert_user(&user).await.unwrap();
        let resolver = IdentityResolver::new(Arc::new(store), &light()).unwrap();

        let err = resolver
            .resolve_by_password("bob", Password::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }
}
