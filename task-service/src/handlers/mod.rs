pub mod admin;
pub mod health;
pub mod metrics;
pub mod organization;
pub mod task;
pub mod user;
