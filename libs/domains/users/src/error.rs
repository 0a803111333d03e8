use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use tokio::task::JoinError;
use uuid::Uuid;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email must be unique!";
pub const NOT_FOUND_MESSAGE: &str = "User not found!";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Connectivity-class failure that a later attempt may not hit
    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Retry predicate: only data-access failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, UserError::DataAccess(_))
    }

    /// Short caller-facing reason for server-side failures.
    fn public_reason(&self) -> &'static str {
        match self {
            UserError::DataAccess(_) => "data store unavailable",
            UserError::PasswordHash(_) => "password could not be processed",
            _ => "unexpected failure",
        }
    }

    /// Convert to an HTTP error, prefixing server-side failures with what was being done.
    ///
    /// `action` reads as "Error {action} user", e.g. `"creating"`.
    pub fn into_app_error(self, action: &str) -> AppError {
        match self {
            UserError::NotFound(_) => AppError::NotFound(NOT_FOUND_MESSAGE.to_string()),
            UserError::DuplicateEmail(_) => AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()),
            UserError::Validation(msg) => AppError::BadRequest(msg),
            other => {
                tracing::error!(error = %other, "User operation failed");
                AppError::InternalServerError(format!(
                    "Error {} user: {}",
                    action,
                    other.public_reason()
                ))
            }
        }
    }
}

impl From<JoinError> for UserError {
    fn from(err: JoinError) -> Self {
        UserError::Internal(format!("Operation task failed: {}", err))
    }
}

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        err.into_app_error("processing")
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
