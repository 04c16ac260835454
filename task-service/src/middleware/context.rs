use std::sync::Arc;

use crate::models::Identity;
use crate::services::AuthError;

/// Per-request scope carried in request extensions.
///
/// Attaching an identity derives a new context; the one it was derived from is left untouched.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: Option<String>,
    identity: Option<Arc<Identity>>,
}

impl RequestContext {
    pub fn new(request_id: Option<String>) -> Self {
        Self {
            request_id,
            identity: None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn with_identity(&self, identity: Identity) -> Self {
        Self {
            request_id: self.request_id.clone(),
            identity: Some(Arc::new(identity)),
        }
    }

    pub fn identity(&self) -> Result<&Identity, AuthError> {
        self.identity.as_deref().ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn alice() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            role: "user".to_string(),
            organization_id: None,
        }
    }

    #[test]
    fn test_attach_then_retrieve() {
        let base = RequestContext::new(Some("req-1".to_string()));
        let identity = alice();

        let derived = base.with_identity(identity.clone());

        assert_eq!(derived.identity().unwrap(), &identity);
        assert_eq!(derived.request_id(), Some("req-1"));
    }

    #[test]
    fn test_original_scope_is_unchanged() {
        let base = RequestContext::default();
        let _derived = base.with_identity(alice());

        assert!(matches!(base.identity(), Err(AuthError::Unauthenticated)));
    }
}
