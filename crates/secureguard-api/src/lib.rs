//! SecureGuard REST API
//!
//! This crate provides the Axum-based HTTP surface of the authentication
//! core: registration, login, token refresh, user administration and the
//! role gates business routers are mounted behind.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
