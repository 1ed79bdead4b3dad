//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use secureguard_db::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("User already exists")]
    DuplicateUser,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Authorization header required")]
    MissingAuthHeader,

    #[error("Authorization header malformed")]
    InvalidAuthHeader,

    #[error("Role not found in token")]
    MissingRole,

    #[error("Invalid role in token: {0}")]
    UnknownRole(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Credential store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Transport status for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidRole(_)
            | AuthError::DuplicateUser
            | AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MissingRole
            | AuthError::UnknownRole(_) => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::StorageUnavailable(_)
            | AuthError::PasswordHash(_)
            | AuthError::Signing(_)
            | AuthError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    ///
    /// Expired and invalid tokens collapse to the same text, and internal
    /// failures never carry storage or crypto detail.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidToken | AuthError::TokenExpired => "Invalid token".to_string(),
            AuthError::UnknownRole(_) => "Invalid role in token".to_string(),
            AuthError::StorageUnavailable(_)
            | AuthError::PasswordHash(_)
            | AuthError::Signing(_)
            | AuthError::Config(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Short label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation",
            AuthError::InvalidEmail(_) => "invalid_email",
            AuthError::InvalidRole(_) => "invalid_role",
            AuthError::DuplicateUser => "duplicate_user",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "expired_token",
            AuthError::MissingAuthHeader => "missing_header",
            AuthError::InvalidAuthHeader => "malformed_header",
            AuthError::MissingRole => "missing_role",
            AuthError::UnknownRole(_) => "unknown_role",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::StorageUnavailable(_) => "storage_unavailable",
            AuthError::PasswordHash(_) => "password_hash",
            AuthError::Signing(_) => "signing",
            AuthError::Config(_) => "config",
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateUsername(_) => AuthError::DuplicateUser,
            DbError::DuplicateEmail(_) => AuthError::DuplicateEmail,
            other => AuthError::StorageUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({
            "error": self.public_message()
        }));

        (self.status_code(), body).into_response()
    }
}
