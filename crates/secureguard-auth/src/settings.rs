//! Immutable authentication settings, built once at startup

use chrono::Duration;
use std::fmt;

use crate::error::AuthError;

/// Default lifetime of every issued token
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest token lifetime accepted from configuration
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Default domain accepted for registration emails
pub const DEFAULT_EMAIL_DOMAIN: &str = "gmail.com";

/// Settings shared read-only by the auth service and every access gate
#[derive(Clone)]
pub struct AuthSettings {
    jwt_secret: String,
    token_ttl: Duration,
    email_domain: String,
}

impl AuthSettings {
    /// Create settings with default TTL and email domain.
    ///
    /// Fails when the signing secret is empty.
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self, AuthError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.trim().is_empty() {
            return Err(AuthError::Config("JWT signing secret must not be empty".to_string()));
        }

        Ok(Self {
            jwt_secret,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        })
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Result<Self, AuthError> {
        if ttl <= Duration::zero() {
            return Err(AuthError::Config("token TTL must be positive".to_string()));
        }
        if ttl > Duration::days(MAX_TOKEN_TTL_DAYS) {
            return Err(AuthError::Config(format!(
                "token TTL must not exceed {} days",
                MAX_TOKEN_TTL_DAYS
            )));
        }
        self.token_ttl = ttl;
        Ok(self)
    }

    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Result<Self, AuthError> {
        let domain = domain.into();
        if domain.trim().is_empty() || domain.contains('@') {
            return Err(AuthError::Config(format!("invalid email domain: {:?}", domain)));
        }
        self.email_domain = domain;
        Ok(self)
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("email_domain", &self.email_domain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(AuthSettings::new(""), Err(AuthError::Config(_))));
        assert!(matches!(AuthSettings::new("   "), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let settings = AuthSettings::new("secret").unwrap();
        assert_eq!(settings.token_ttl(), Duration::hours(24));
        assert_eq!(settings.email_domain(), "gmail.com");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = AuthSettings::new("super-secret-value").unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("super-secret-value"));
    }

    #[test]
    fn test_overrides_validated() {
        let settings = AuthSettings::new("secret").unwrap();
        assert!(settings.clone().with_token_ttl(Duration::zero()).is_err());
        assert!(settings.clone().with_email_domain("").is_err());
        assert!(settings.clone().with_email_domain("@corp.example").is_err());

        let custom = settings
            .with_token_ttl(Duration::hours(1))
            .unwrap()
            .with_email_domain("corp.example")
            .unwrap();
        assert_eq!(custom.token_ttl(), Duration::hours(1));
        assert_eq!(custom.email_domain(), "corp.example");
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let settings = AuthSettings::new("secret").unwrap();

        assert!(matches!(
            settings.clone().with_token_ttl(Duration::hours(3_000_000_000)),
            Err(AuthError::Config(_))
        ));
        assert!(
            settings
                .clone()
                .with_token_ttl(Duration::days(MAX_TOKEN_TTL_DAYS) + Duration::seconds(1))
                .is_err()
        );
        assert!(settings.with_token_ttl(Duration::days(MAX_TOKEN_TTL_DAYS)).is_ok());
    }
}
