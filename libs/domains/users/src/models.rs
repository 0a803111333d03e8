use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Emails are stored and compared in this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User entity - matches the `users` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all users, lowercase
    pub email: String,
    /// Argon2 PHC string; never leaves the domain
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user (password must already be hashed)
    pub fn new(first_name: String, last_name: String, email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

/// DTO for creating a new user
#[derive(Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(
        length(min = 2, max = 100, message = "must be between 2 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Ada", min_length = 2)]
    pub first_name: String,

    #[validate(
        length(min = 2, max = 100, message = "must be between 2 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Lovelace", min_length = 2)]
    pub last_name: String,

    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255)
    )]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "must be between 6 and 128 characters"))]
    #[schema(example = "s3cret!", min_length = 6, format = Password)]
    pub password: String,
}

// Keeps the plaintext password out of logs
impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful `POST /users`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    #[schema(example = "User created successfully.")]
    pub message: String,
    pub operation_id: String,
    pub user: UserResponse,
}

/// Body of a successful `DELETE /users/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    #[schema(example = "User deleted successfully.")]
    pub message: String,
    pub operation_id: String,
}
