use serde::Serialize;
use uuid::Uuid;

use super::{Role, UserRecord};
use crate::services::AuthError;

/// The authenticated caller for the duration of one request.
///
/// Built fresh from the stored user on every resolution. `role` is kept as stored so an
/// unrecognised value can still be reported and rejected by the authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub organization_id: Option<Uuid>,
}

impl Identity {
    pub fn role(&self) -> Result<Role, AuthError> {
        self.role.parse()
    }
}

impl From<&UserRecord> for Identity {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            organization_id: user.organization_id,
        }
    }
}
