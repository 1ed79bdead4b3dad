//! User management routes (admin only)

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    routing::get,
};
use secureguard_auth::validation::{parse_role, validate_password, validate_username};
use secureguard_auth::{AuthUser, hash_password, require_role};
use secureguard_db::{UserRole, UserUpdate};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{UpdateUserRequest, UserResponse};

/// GET /users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(user.into()))
}

/// Validate the requested changes and turn them into a storage update
async fn build_update(state: &AppState, request: UpdateUserRequest) -> Result<UserUpdate, ApiError> {
    if let Some(username) = &request.username {
        validate_username(username)?;
    }
    if let Some(email) = &request.email {
        state.auth.email_policy().validate(email)?;
    }
    let role = request.role.as_deref().map(parse_role).transpose()?;

    let password_hash = match request.password {
        Some(password) => {
            validate_password(&password)?;
            let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
                .await
                .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;
            Some(hashed)
        }
        None => None,
    };

    Ok(UserUpdate {
        username: request.username,
        email: request.email,
        password_hash,
        role,
    })
}

/// PUT /users/{id}
async fn update_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("invalid request".to_string()))?;

    debug!("Admin {} updating user: {}", admin.id, id);

    let update = build_update(&state, request).await?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let user = state
        .db
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {} (role {})", user.username, user.role);

    Ok(Json(user.into()))
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("Admin {} deleting user: {}", admin.id, id);

    if state.db.delete_user(id).await? {
        info!("Deleted user: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User: {}", id)))
    }
}

/// Create user routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.gate(UserRole::Admin),
            require_role,
        ))
}
