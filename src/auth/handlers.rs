//! Auth HTTP handlers: signup, login, current user.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::PublicUser;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: PublicUser,
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Json(mut body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    body.email = body.email.trim().to_string();
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .auth_service()
        .signup(&body.email, &body.first_name, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = state
        .auth_service()
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: token.token,
        token_type: "bearer",
        user,
    }))
}

/// GET /me
pub async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user)
}
