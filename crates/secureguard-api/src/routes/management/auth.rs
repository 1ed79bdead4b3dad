//! Authentication routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    middleware,
    routing::{get, post},
};
use secureguard_auth::{AuthUser, bearer_token, require_role};
use secureguard_db::UserRole;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    CurrentUserResponse, LoginRequest, MessageResponse, RegisterRequest, TokenResponse,
};

/// Unwrap a JSON body, answering malformed input with a plain 400
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection);
        ApiError::BadRequest("invalid request".to_string())
    })
}

/// POST /users/register
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = json_body(payload)?;

    let issued = state
        .auth
        .register(
            &request.username,
            &request.email,
            &request.role,
            &request.password,
        )
        .await?;

    Ok(Json(issued.into()))
}

/// POST /users/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = json_body(payload)?;

    let issued = state.auth.login(&request.username, &request.password).await?;

    Ok(Json(issued.into()))
}

/// POST /users/refresh (viewer)
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let issued = state.auth.refresh(token).await?;

    Ok(Json(issued.into()))
}

/// POST /users/logout (viewer)
///
/// Tokens are not tracked server-side, so this only acknowledges; the
/// token stays valid until it expires.
async fn logout(user: AuthUser) -> Json<MessageResponse> {
    debug!("User id {} logged out", user.id);

    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// GET /users/me (viewer)
async fn me(user: AuthUser) -> Json<CurrentUserResponse> {
    Json(user.into())
}

/// Create auth routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/users/refresh", post(refresh))
        .route("/users/logout", post(logout))
        .route("/users/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.gate(UserRole::Viewer),
            require_role,
        ));

    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .merge(authenticated)
}
