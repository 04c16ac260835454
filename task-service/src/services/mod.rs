//! Services layer for task-service.
//!
//! Identity resolution, authorization predicates, password policy and the persistence
//! contracts with their Postgres and in-memory implementations.

pub mod authz;
mod database;
pub mod error;
pub mod identity;
mod memory;
pub mod metrics;
pub mod policy;
pub mod store;

pub use authz::{require_any_role, require_permission};
pub use database::Database;
pub use error::{AuthError, ServiceError};
pub use identity::IdentityResolver;
pub use memory::MemoryStore;
pub use policy::{PasswordPolicy, PolicyViolations};
pub use store::{OrganizationStore, TaskStore, UserStore};
