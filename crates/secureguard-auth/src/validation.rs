//! Input rules for identities

use regex::Regex;
use secureguard_db::UserRole;

use crate::error::AuthError;

/// Maximum allowed username length
pub const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
pub const MAX_PASSWORD_LENGTH: usize = 256;

/// Validate username format and length
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::Validation("Username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(AuthError::Validation(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::Validation("Password cannot be empty".to_string()));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Parse a role name from request input
pub fn parse_role(role: &str) -> Result<UserRole, AuthError> {
    role.parse().map_err(|_| {
        AuthError::InvalidRole("role must be one of admin, analyst, viewer".to_string())
    })
}

/// Accepted shape of registration emails: a plain local part at one domain
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    domain: String,
    pattern: Regex,
}

impl EmailPolicy {
    pub fn new(domain: &str) -> Result<Self, AuthError> {
        let pattern = Regex::new(&format!(r"^[a-zA-Z0-9._%+\-]+@{}$", regex::escape(domain)))
            .map_err(|e| AuthError::Config(format!("invalid email domain pattern: {}", e)))?;

        Ok(Self {
            domain: domain.to_string(),
            pattern,
        })
    }

    pub fn validate(&self, email: &str) -> Result<(), AuthError> {
        if self.pattern.is_match(email) {
            Ok(())
        } else {
            Err(AuthError::InvalidEmail(format!(
                "email must be a valid {} address",
                self.domain
            )))
        }
    }
}
