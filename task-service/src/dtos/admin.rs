use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}
