use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::dtos::ErrorResponse;

pub const GENDERS: [&str; 4] = ["male", "female", "other", "prefer_not_to_say"];
const TASK_DESCRIPTION_PUNCTUATION: &str = ".,!?-";

pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let err_resp = ErrorResponse {
                error: format!("Json parse error: {}", e),
            };
            (StatusCode::BAD_REQUEST, Json(err_resp)).into_response()
        })?;

        value.validate().map_err(|e| {
            let err_resp = ErrorResponse {
                error: format!("Validation error: {}", e),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(err_resp)).into_response()
        })?;

        Ok(ValidatedJson(value))
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Letter first, alphanumeric last, 3 to 25 characters of letters, digits and `_`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let chars: Vec<char> = username.chars().collect();
    let valid = (3..=25).contains(&chars.len())
        && chars[0].is_ascii_alphabetic()
        && chars[chars.len() - 1].is_ascii_alphanumeric()
        && chars.iter().all(|c| c.is_ascii_alphanumeric() || *c == '_');

    if valid {
        Ok(())
    } else {
        Err(invalid(
            "username",
            "Username must be 3-25 characters, start with a letter, end with a letter or digit, \
             and contain only letters, digits and underscores",
        ))
    }
}

pub fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    if GENDERS.contains(&gender) {
        Ok(())
    } else {
        Err(invalid(
            "gender",
            "Gender must be one of: male, female, other, prefer_not_to_say",
        ))
    }
}

pub fn validate_task_title(title: &str) -> Result<(), ValidationError> {
    if !title.trim().is_empty()
        && title
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
    {
        Ok(())
    } else {
        Err(invalid(
            "title",
            "Title may only contain letters, numbers and spaces",
        ))
    }
}

pub fn validate_task_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().all(|c| {
        c.is_ascii_alphanumeric() || c.is_whitespace() || TASK_DESCRIPTION_PUNCTUATION.contains(c)
    }) {
        Ok(())
    } else {
        Err(invalid(
            "description",
            "Description may only contain letters, numbers, spaces and .,!?-",
        ))
    }
}
