//! Role and permission checks over a resolved identity.
//!
//! Both checks are pure predicates; the middleware in `crate::middleware::rbac` turns a failure
//! into the 403 response.

use crate::models::{Identity, Permission, Role};
use crate::services::AuthError;

/// Pass if the identity's role is one of `allowed`, or outranks the lowest of them.
///
/// Roles outside the hierarchy never pass, and neither does an empty `allowed` list.
pub fn require_any_role(identity: &Identity, allowed: &[Role]) -> Result<(), AuthError> {
    let Ok(role) = identity.role() else {
        tracing::debug!(role = %identity.role, "Role outside hierarchy");
        return Err(AuthError::Forbidden);
    };

    if allowed.contains(&role) {
        return Ok(());
    }

    match allowed.iter().map(Role::rank).min() {
        Some(min_rank) if role.rank() >= min_rank => Ok(()),
        _ => Err(AuthError::Forbidden),
    }
}

/// Pass iff the identity's role is granted `permission` exactly. No rank fallback.
pub fn require_permission(identity: &Identity, permission: Permission) -> Result<(), AuthError> {
    let role = identity.role()?;

    if role.has_permission(permission) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            role: role.to_string(),
            organization_id: None,
        }
    }

    #[test]
    fn test_owner_satisfies_admin() {
        assert!(require_any_role(&identity("owner"), &[Role::Admin]).is_ok());
    }

    #[test]
    fn test_user_fails_admin() {
        assert!(matches!(
            require_any_role(&identity("user"), &[Role::Admin]),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn test_literal_match_and_minimum_rank() {
        assert!(require_any_role(&identity("user"), &[Role::Owner, Role::User]).is_ok());
        assert!(require_any_role(&identity("moderator"), &[Role::Owner, Role::User]).is_ok());
        assert!(require_any_role(&identity("moderator"), &[Role::Admin, Role::Owner]).is_err());
    }

    #[test]
    fn test_unknown_role_and_empty_list_fail() {
        assert!(require_any_role(&identity("superuser"), &[Role::User]).is_err());
        assert!(require_any_role(&identity("owner"), &[]).is_err());
    }

    #[test]
    fn test_moderator_has_delete() {
        assert!(require_permission(&identity("moderator"), Permission::Delete).is_ok());
    }

    #[test]
    fn test_user_lacks_delete() {
        assert!(matches!(
            require_permission(&identity("user"), Permission::Delete),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn test_permission_has_no_rank_fallback() {
        assert!(require_permission(&identity("moderator"), Permission::Admin).is_err());
        assert!(require_permission(&identity("owner"), Permission::Admin).is_ok());
    }

    #[test]
    fn test_unknown_role_permission() {
        assert!(matches!(
            require_permission(&identity("guest"), Permission::Read),
            Err(AuthError::UnknownRole(r)) if r == "guest"
        ));
    }
}
