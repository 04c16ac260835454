use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[serde(default)]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

pub const MAX_ORGANIZATION_NAME: usize = 100;

/// Trimmed organization name, or the message to reject it with.
pub fn normalize_organization_name(name: &str) -> Result<String, &'static str> {
    let name = name.trim();
    if name.is_empty() {
        Err("Organization name is required")
    } else if name.chars().count() > MAX_ORGANIZATION_NAME {
        Err("Organization name must be less than 100 characters")
    } else {
        Ok(name.to_string())
    }
}
