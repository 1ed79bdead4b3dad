//! SecureGuard Authentication and Authorization
//!
//! This crate provides credential verification, JWT session tokens and the
//! role-hierarchy access gate that guards every protected route.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod settings;
pub mod store;
pub mod validation;

pub use error::AuthError;
pub use jwt::{Claims, JwtManager};
pub use middleware::{AccessGate, AuthUser, bearer_token, extract_bearer_token, require_role};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, IssuedToken};
pub use settings::AuthSettings;
pub use store::CredentialStore;
