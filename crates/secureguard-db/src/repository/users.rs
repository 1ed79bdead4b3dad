//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User, UserUpdate};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user.
    ///
    /// Returns `DuplicateUsername` / `DuplicateEmail` when the row collides
    /// with an existing identity, including collisions that slipped past a
    /// caller's earlier existence checks.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_user_write(e, &user.username, &user.email))?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check whether a username is taken
    pub async fn username_exists(&self, username: &str) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?) AS found")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    /// Check whether an email is already registered
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?) AS found")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Apply a partial update to a user.
    ///
    /// Returns `Ok(None)` when no user has the given ID.
    pub async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE(?, username),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                role = COALESCE(?, role),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.username.as_deref())
        .bind(update.email.as_deref())
        .bind(update.password_hash.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_user_write(
                e,
                update.username.as_deref().unwrap_or_default(),
                update.email.as_deref().unwrap_or_default(),
            )
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user_by_id(id).await
    }

    /// Delete a user
    pub async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: UserRole::Viewer,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_user() {
        let db = Database::in_memory().await.unwrap();
        assert!(!db.has_users().await.unwrap());

        let user = db.insert_user(new_user("alice", "alice@gmail.com")).await.unwrap();
        assert!(user.id > 0);

        let fetched = db.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.email, "alice@gmail.com");
        assert_eq!(fetched.role, UserRole::Viewer);

        let by_id = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(db.username_exists("alice").await.unwrap());
        assert!(!db.username_exists("bob").await.unwrap());
        assert!(db.email_exists("alice@gmail.com").await.unwrap());
        assert!(!db.email_exists("bob@gmail.com").await.unwrap());
        assert!(db.get_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_violations_are_translated() {
        let db = Database::in_memory().await.unwrap();
        db.insert_user(new_user("alice", "alice@gmail.com")).await.unwrap();

        let err = db
            .insert_user(new_user("alice", "other@gmail.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateUsername(ref u) if u == "alice"));

        let err = db
            .insert_user(new_user("bob", "alice@gmail.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateEmail(ref e) if e == "alice@gmail.com"));
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = Database::in_memory().await.unwrap();
        let alice = db.insert_user(new_user("alice", "alice@gmail.com")).await.unwrap();
        db.insert_user(new_user("bob", "bob@gmail.com")).await.unwrap();

        let updated = db
            .update_user(
                alice.id,
                UserUpdate {
                    role: Some(UserRole::Analyst),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, UserRole::Analyst);
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.password_hash, alice.password_hash);

        let err = db
            .update_user(
                alice.id,
                UserUpdate {
                    email: Some("bob@gmail.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateEmail(_)));

        let missing = db.update_user(9999, UserUpdate::default()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete_users() {
        let db = Database::in_memory().await.unwrap();
        let bob = db.insert_user(new_user("bob", "bob@gmail.com")).await.unwrap();
        db.insert_user(new_user("alice", "alice@gmail.com")).await.unwrap();

        let users = db.list_users().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(db.delete_user(bob.id).await.unwrap());
        assert!(!db.delete_user(bob.id).await.unwrap());
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }
}
