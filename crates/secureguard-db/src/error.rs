//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl DbError {
    /// Translate a unique-constraint violation on the users table into the
    /// matching duplicate error, leaving every other error untouched.
    pub(crate) fn from_user_write(err: sqlx::Error, username: &str, email: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            let message = db_err.message();
            if message.contains("users.email") {
                return DbError::DuplicateEmail(email.to_string());
            }
            if message.contains("users.username") {
                return DbError::DuplicateUsername(username.to_string());
            }
        }
        DbError::Connection(err)
    }
}
