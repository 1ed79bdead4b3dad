//! Identity API routes
//!
//! Registration, login and token refresh, plus admin-only user management.
//! Each protected route carries its own access gate.

pub mod auth;
pub mod types;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create identity API routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes(state))
        .merge(users::routes(state))
}
