//! Bearer-token extractor for authenticated routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use tracing::debug;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::PublicUser;

/// Extractor: the user a valid `Authorization: Bearer <token>` header resolves to.
#[derive(Clone, Debug)]
pub struct AuthUser(pub PublicUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    debug!(error = %e, "missing or malformed Authorization header");
                    AppError::InvalidCredentials
                })?;
        let user = state.auth_service().authenticate(bearer.token()).await?;
        Ok(AuthUser(user))
    }
}
