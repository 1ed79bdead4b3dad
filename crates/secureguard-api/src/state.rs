//! Application state

use secureguard_auth::{AccessGate, AuthError, AuthService, AuthSettings, JwtManager};
use secureguard_db::{Database, UserRole};
use std::sync::Arc;

/// Prometheus render handle served at `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthService>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    /// Wire the auth service and token codec from one set of settings
    pub fn new(db: Database, settings: &AuthSettings) -> Result<Self, AuthError> {
        let jwt = Arc::new(JwtManager::new(settings.jwt_secret()));
        let auth = Arc::new(AuthService::new(Arc::new(db.clone()), jwt.clone(), settings)?);

        Ok(Self { db, auth, jwt })
    }

    /// Gate admitting callers whose role is at least `required`
    pub fn gate(&self, required: UserRole) -> AccessGate {
        AccessGate::new(self.jwt.clone(), required)
    }
}
