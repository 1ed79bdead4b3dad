//! SecureGuard Credential Store
//!
//! This crate holds the identity records consumed by the authentication
//! core, using SQLite via sqlx for persistence.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
