//! Shared state and the health probe.

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::AuthService;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(auth_service: AuthService) -> Self {
        Self { auth_service }
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "authsvc" })),
    )
}
