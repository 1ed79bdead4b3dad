//! Credential store seam

use async_trait::async_trait;
use secureguard_db::{Database, DbError, NewUser, User};

/// Identity persistence consumed by the auth service.
///
/// `create` must enforce username and email uniqueness itself and report
/// collisions as `DbError::DuplicateUsername` / `DbError::DuplicateEmail`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn username_exists(&self, username: &str) -> Result<bool, DbError>;

    async fn email_exists(&self, email: &str) -> Result<bool, DbError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    /// Persist a new identity and return its generated ID
    async fn create(&self, user: NewUser) -> Result<i64, DbError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn username_exists(&self, username: &str) -> Result<bool, DbError> {
        Database::username_exists(self, username).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DbError> {
        Database::email_exists(self, email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        self.get_user_by_username(username).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        self.get_user_by_id(id).await
    }

    async fn create(&self, user: NewUser) -> Result<i64, DbError> {
        self.insert_user(user).await.map(|u| u.id)
    }
}
