use service_core::error::AppError;
use thiserror::Error;

/// Failures of credential extraction, identity resolution, authorization and password hashing.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredential,

    #[error("malformed authorization header")]
    MalformedCredential,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: insufficient permissions")]
    Forbidden,

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("invalid password hash format")]
    InvalidHashFormat,

    #[error("incompatible argon2 version: {0}")]
    IncompatibleVersion(u32),

    #[error("secure randomness unavailable: {0}")]
    CryptoFailure(String),

    #[error("password is required")]
    EmptyPassword,

    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl AuthError {
    /// Short label for logs and the `auth_failures_total` counter.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden => "forbidden",
            AuthError::UnknownRole(_) => "unknown_role",
            AuthError::InvalidHashFormat => "invalid_hash_format",
            AuthError::IncompatibleVersion(_) => "incompatible_version",
            AuthError::CryptoFailure(_) => "crypto_failure",
            AuthError::EmptyPassword => "empty_password",
            AuthError::InvalidParams(_) => "invalid_params",
            AuthError::Internal(_) => "internal",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => {
                AppError::Unauthorized(anyhow::anyhow!("missing authorization header"))
            }
            // Malformed and unknown keys look the same from outside
            AuthError::MalformedCredential | AuthError::InvalidCredential => {
                AppError::Unauthorized(anyhow::anyhow!("invalid credentials"))
            }
            AuthError::Unauthenticated => AppError::Unauthorized(anyhow::anyhow!("unauthenticated")),
            AuthError::Forbidden | AuthError::UnknownRole(_) => {
                AppError::Forbidden(anyhow::anyhow!("forbidden: insufficient permissions"))
            }
            AuthError::EmptyPassword => AppError::BadRequest(anyhow::anyhow!("password is required")),
            AuthError::Internal(e) => e,
            other @ (AuthError::InvalidHashFormat
            | AuthError::IncompatibleVersion(_)
            | AuthError::CryptoFailure(_)
            | AuthError::InvalidParams(_)) => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

/// Failures of the persistence layer and the request handlers built on it.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::BadRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Auth(e) => e.into(),
        }
    }
}

impl From<ServiceError> for AuthError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Auth(e) => e,
            other => AuthError::Internal(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::{http::StatusCode, response::IntoResponse};

    fn status_of(err: AuthError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_auth_error_status_mapping() {
        assert_eq!(status_of(AuthError::MissingCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::MalformedCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::InvalidCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthError::UnknownRole("guest".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(AuthError::EmptyPassword), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AuthError::InvalidHashFormat),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AuthError::CryptoFailure("no entropy".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_and_invalid_share_message() {
        let malformed = AppError::from(AuthError::MalformedCredential).to_string();
        let invalid = AppError::from(AuthError::InvalidCredential).to_string();
        assert_eq!(malformed, invalid);
    }

    #[test]
    fn test_service_error_mapping() {
        let res = AppError::from(ServiceError::NotFound("Task not found".into())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = AppError::from(ServiceError::Auth(AuthError::Forbidden)).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
