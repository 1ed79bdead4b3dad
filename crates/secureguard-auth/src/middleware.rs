//! Access gate middleware for Axum
//!
//! Every protected route is wrapped with an [`AccessGate`] naming the minimum
//! role it accepts. Per request the gate walks
//! `NoToken -> HeaderChecked -> Decoded -> RoleChecked` and either admits the
//! request, attaching the verified [`AuthUser`] to its extensions, or rejects
//! it. The gate never touches storage and never issues tokens.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use secureguard_db::UserRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};

/// Authenticated caller information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub role: UserRole,
}

impl AuthUser {
    /// Build from validated claims; the role claim must be present and known
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let role_str = claims.role.as_deref().ok_or(AuthError::MissingRole)?;
        let role = role_str
            .parse()
            .map_err(|_| AuthError::UnknownRole(role_str.to_string()))?;

        Ok(Self {
            id: claims.subject_id()?,
            role,
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when an AccessGate admitted the request
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Read and shape-check the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingAuthHeader)?;
    let header = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    extract_bearer_token(header)
}

/// Per-route minimum-role filter
#[derive(Clone)]
pub struct AccessGate {
    jwt: Arc<JwtManager>,
    required: UserRole,
}

impl AccessGate {
    pub fn new(jwt: Arc<JwtManager>, required: UserRole) -> Self {
        Self { jwt, required }
    }

    /// Decide whether a request carrying these headers is admitted
    pub fn check(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.jwt.validate_token(token)?;
        let user = AuthUser::from_claims(&claims)?;

        if !user.role.satisfies(self.required) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(user)
    }
}

/// Middleware enforcing an [`AccessGate`].
///
/// Install with `axum::middleware::from_fn_with_state(gate, require_role)`.
pub async fn require_role(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match gate.check(request.headers()) {
        Ok(user) => user,
        Err(e) => {
            metrics::counter!("secureguard_auth_rejections_total", "reason" => e.reason())
                .increment(1);
            match &e {
                AuthError::InsufficientPermissions | AuthError::UnknownRole(_) => warn!(
                    "Rejected {} {}: {} (requires {})",
                    request.method(),
                    request.uri().path(),
                    e.reason(),
                    gate.required
                ),
                _ => debug!(
                    "Rejected {} {}: {}",
                    request.method(),
                    request.uri().path(),
                    e.reason()
                ),
            }
            return Err(e);
        }
    };

    debug!("Authenticated user id {} ({})", user.id, user.role);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use tower::ServiceExt;

    const SECRET: &str = "gate-test-secret";

    fn jwt() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(SECRET))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn token_for(jwt: &JwtManager, role: Option<UserRole>) -> String {
        jwt.generate_token(5, role, Duration::hours(1)).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_bearer_token("abc.def.ghi").is_err());
        assert!(extract_bearer_token("Basic abc").is_err());
        assert!(extract_bearer_token("bearer abc").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
        assert!(extract_bearer_token("Bearer a b").is_err());
    }

    #[test]
    fn test_header_stages() {
        let gate = AccessGate::new(jwt(), UserRole::Viewer);

        assert!(matches!(gate.check(&HeaderMap::new()), Err(AuthError::MissingAuthHeader)));
        assert!(matches!(
            gate.check(&headers_with("Token abc")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            gate.check(&headers_with("Bearer not-a-jwt")),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_role_hierarchy_admission() {
        let jwt = jwt();

        for caller in UserRole::ALL {
            let headers = headers_with(&format!("Bearer {}", token_for(&jwt, Some(caller))));
            for required in UserRole::ALL {
                let gate = AccessGate::new(jwt.clone(), required);
                let result = gate.check(&headers);
                if caller.rank() >= required.rank() {
                    let user = result.unwrap();
                    assert_eq!(user, AuthUser { id: 5, role: caller });
                } else {
                    assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
                }
            }
        }
    }

    #[test]
    fn test_analyst_on_viewer_and_admin_routes() {
        let jwt = jwt();
        let headers = headers_with(&format!(
            "Bearer {}",
            token_for(&jwt, Some(UserRole::Analyst))
        ));

        assert!(AccessGate::new(jwt.clone(), UserRole::Viewer).check(&headers).is_ok());
        assert!(matches!(
            AccessGate::new(jwt, UserRole::Admin).check(&headers),
            Err(AuthError::InsufficientPermissions)
        ));
    }

    #[test]
    fn test_roleless_token_fails_every_gate() {
        let jwt = jwt();
        let headers = headers_with(&format!("Bearer {}", token_for(&jwt, None)));

        for required in UserRole::ALL {
            let gate = AccessGate::new(jwt.clone(), required);
            assert!(matches!(gate.check(&headers), Err(AuthError::MissingRole)));
        }
    }

    #[test]
    fn test_unknown_role_claim_rejected() {
        let claims = json!({
            "sub": "5",
            "role": "superadmin",
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let gate = AccessGate::new(jwt(), UserRole::Viewer);

        assert!(matches!(
            gate.check(&headers_with(&format!("Bearer {}", token))),
            Err(AuthError::UnknownRole(ref r)) if r == "superadmin"
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = jwt();
        let token = jwt
            .generate_token(5, Some(UserRole::Admin), Duration::seconds(-30))
            .unwrap();
        let gate = AccessGate::new(jwt, UserRole::Viewer);

        let err = gate.check(&headers_with(&format!("Bearer {}", token))).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.public_message(), "Invalid token");
    }

    async fn whoami(user: AuthUser) -> Json<AuthUser> {
        Json(user)
    }

    fn app(jwt: Arc<JwtManager>, required: UserRole) -> Router {
        Router::new()
            .route("/protected", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                AccessGate::new(jwt, required),
                require_role,
            ))
    }

    async fn call(app: Router, auth: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_middleware_attaches_identity() {
        let jwt = jwt();
        let token = token_for(&jwt, Some(UserRole::Admin));

        let (status, body) = call(app(jwt, UserRole::Analyst), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 5);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_middleware_rejections() {
        let jwt = jwt();

        let (status, body) = call(app(jwt.clone(), UserRole::Viewer), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header required");

        let (status, body) = call(app(jwt.clone(), UserRole::Viewer), Some("Bearer".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header malformed");

        let viewer = token_for(&jwt, Some(UserRole::Viewer));
        let (status, body) = call(app(jwt, UserRole::Admin), Some(format!("Bearer {}", viewer))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Insufficient permissions");
    }
}
