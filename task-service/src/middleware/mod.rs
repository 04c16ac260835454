pub mod auth;
pub mod context;
pub mod rbac;

pub use auth::{auth_middleware, AuthUser};
pub use context::RequestContext;
pub use rbac::{require_permission, require_roles, RequiredPermission, RequiredRoles};
