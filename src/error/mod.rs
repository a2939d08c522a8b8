//! Application error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors.
///
/// Every variant is a per-request failure. `StoreUnavailable` is the only one
/// a caller may retry.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Password is too short")]
    WeakPassword,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("User store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable reason code sent to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::WeakPassword => "weak_password",
            AppError::DuplicateEmail => "duplicate_email",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Validation(_) => "validation_failed",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::TokenExpired => "token_expired",
            AppError::TokenInvalid => "token_invalid",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::WeakPassword
            | AppError::DuplicateEmail
            | AppError::InvalidInput(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::TokenExpired | AppError::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }
}

/// Connection-level failures are transient; anything the server or the
/// decoder rejected is not.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::StoreUnavailable(e.to_string()),
            other => AppError::Internal(anyhow::anyhow!("database: {}", other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store and internal details stay in the logs.
        let message = match &self {
            AppError::StoreUnavailable(detail) => {
                tracing::error!(error = %detail, "user store unavailable");
                "Service temporarily unavailable".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message, "reason": self.reason() }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::WeakPassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TokenInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::StoreUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn only_store_unavailable_is_retryable() {
        assert!(AppError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(!AppError::InvalidCredentials.is_retryable());
        assert!(!AppError::DuplicateEmail.is_retryable());
        assert!(!AppError::Internal(anyhow::anyhow!("boom")).is_retryable());
    }

    #[test]
    fn only_connection_level_sqlx_errors_are_retryable() {
        assert!(AppError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(AppError::from(sqlx::Error::PoolClosed).is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(AppError::from(sqlx::Error::Io(io)).is_retryable());

        let not_found = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(not_found, AppError::Internal(_)));
        assert!(!not_found.is_retryable());
        let decode = AppError::from(sqlx::Error::ColumnNotFound("email".to_string()));
        assert!(!decode.is_retryable());
    }

    #[tokio::test]
    async fn store_details_are_not_echoed() {
        let res = AppError::StoreUnavailable("connection refused to 10.0.0.5".into()).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["reason"], "store_unavailable");
        assert!(!json["error"].as_str().unwrap().contains("10.0.0.5"));
    }
}
