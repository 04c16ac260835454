pub mod identity;
pub mod organization;
pub mod role;
pub mod task;
pub mod user;

pub use identity::Identity;
pub use organization::{Organization, OrganizationChanges};
pub use role::{Permission, Role};
pub use task::{Task, TaskChanges};
pub use user::{UserChanges, UserRecord, UserResponse};
