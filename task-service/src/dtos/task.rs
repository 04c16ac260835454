use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::{validate_task_description, validate_task_title};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_task_title")
    )]
    pub title: String,
    #[validate(
        length(max = 2255, message = "Description must be at most 2255 characters"),
        custom(function = "validate_task_description")
    )]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_task_title")
    )]
    pub title: String,
    #[validate(
        length(max = 2255, message = "Description must be at most 2255 characters"),
        custom(function = "validate_task_description")
    )]
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleCompletionRequest {
    pub is_completed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

impl SearchParams {
    /// Requested limit, defaulting to 10 and capped at 100. Zero falls back to the default.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(0) | None => DEFAULT_SEARCH_LIMIT,
            Some(limit) => limit.min(MAX_SEARCH_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        let params = |limit| SearchParams {
            query: String::new(),
            limit,
        };
        assert_eq!(params(None).effective_limit(), 10);
        assert_eq!(params(Some(0)).effective_limit(), 10);
        assert_eq!(params(Some(25)).effective_limit(), 25);
        assert_eq!(params(Some(5000)).effective_limit(), 100);
    }

    #[test]
    fn test_title_length_limit() {
        let request = CreateTaskRequest {
            title: "a".repeat(256),
            description: None,
        };
        assert!(request.validate().is_err());
    }
}
