//! Registration, login and token refresh

use chrono::Duration;
use secureguard_db::NewUser;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::jwt::JwtManager;
use crate::password::{DUMMY_HASH, hash_password, verify_password};
use crate::settings::AuthSettings;
use crate::store::CredentialStore;
use crate::validation::{
    EmailPolicy, MAX_PASSWORD_LENGTH, parse_role, validate_password, validate_username,
};

/// A freshly signed token and its lifetime in seconds
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Orchestrates credential checks against the store and token issuance
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: Arc<JwtManager>,
    email_policy: EmailPolicy,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt: Arc<JwtManager>,
        settings: &AuthSettings,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            jwt,
            email_policy: EmailPolicy::new(settings.email_domain())?,
            token_ttl: settings.token_ttl(),
        })
    }

    pub fn email_policy(&self) -> &EmailPolicy {
        &self.email_policy
    }

    /// Register a new identity and issue a role-bearing token for it
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        role: &str,
        password: &str,
    ) -> Result<IssuedToken, AuthError> {
        let result = self.try_register(username, email, role, password).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.reason(),
        };
        metrics::counter!("secureguard_registrations_total", "outcome" => outcome).increment(1);
        result
    }

    async fn try_register(
        &self,
        username: &str,
        email: &str,
        role: &str,
        password: &str,
    ) -> Result<IssuedToken, AuthError> {
        validate_username(username)?;
        validate_password(password)?;

        if self.store.username_exists(username).await? {
            debug!("Registration rejected, username taken: {}", username);
            return Err(AuthError::DuplicateUser);
        }

        self.email_policy.validate(email)?;
        if self.store.email_exists(email).await? {
            debug!("Registration rejected, email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let role = parse_role(role)?;

        let plaintext = password.to_string();
        let password_hash = run_blocking(move || hash_password(&plaintext)).await??;

        // The store's unique constraints catch registrations that raced past
        // the checks above; those surface as DuplicateUser / DuplicateEmail.
        let id = self
            .store
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;

        info!("Registered user {} (id {}, role {})", username, id, role);

        self.issue(id, role)
    }

    /// Check a username/password pair and issue a role-bearing token.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let result = self.try_login(username, password).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.reason(),
        };
        metrics::counter!("secureguard_logins_total", "outcome" => outcome).increment(1);
        result
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        debug!("Login attempt for user: {}", username);

        if password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.store.find_by_username(username).await?;

        // Always run a verification so a missing user costs the same as a
        // wrong password.
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let plaintext = password.to_string();
        let password_valid =
            run_blocking(move || verify_password(&plaintext, &stored_hash)).await?;

        let user = match (user, password_valid) {
            (Some(u), true) => u,
            _ => {
                debug!("Login failed for user: {}", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        info!("User {} logged in successfully", user.username);

        self.issue(user.id, user.role)
    }

    /// Exchange a still-valid token for a fresh one.
    ///
    /// Expired tokens are not refreshable. The role is re-read from the
    /// store, so the new token reflects the identity's current role and a
    /// deleted identity can no longer refresh.
    pub async fn refresh(&self, old_token: &str) -> Result<IssuedToken, AuthError> {
        let claims = match self.jwt.validate_token(old_token) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => {
                debug!("Refresh rejected: token expired");
                return Err(AuthError::InvalidToken);
            }
            Err(e) => return Err(e),
        };

        let id = claims.subject_id()?;
        let user = self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!("Refresh rejected: user id {} no longer exists", id);
            AuthError::InvalidToken
        })?;

        debug!("Refreshing token for user {}", user.username);

        self.issue(user.id, user.role)
    }

    fn issue(&self, id: i64, role: secureguard_db::UserRole) -> Result<IssuedToken, AuthError> {
        let token = self.jwt.generate_token(id, Some(role), self.token_ttl)?;
        Ok(IssuedToken {
            token,
            expires_in: self.token_ttl.num_seconds(),
        })
    }
}

/// Run CPU-heavy password work on the blocking pool
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::PasswordHash(format!("Task join error: {}", e)))
}
