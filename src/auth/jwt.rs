//! JWT issue and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // normalized email
    pub iat: i64,
    pub exp: i64,
}

/// A signed token together with the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and checks HMAC JWTs with the process-held secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> AppResult<Self> {
        let lifetime = Duration::from_std(config.access_ttl)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token lifetime: {}", e)))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            lifetime,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Token for `subject`, expiring at `issued_at + lifetime`.
    pub fn issue(&self, subject: &str, issued_at: DateTime<Utc>) -> AppResult<IssuedToken> {
        if subject.is_empty() {
            return Err(AppError::InvalidInput("token subject must not be empty".to_string()));
        }
        let expires_at = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("token expiry out of range")))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("jwt encode: {}", e)))?;
        debug!(exp = claims.exp, "token issued");
        Ok(IssuedToken { token, expires_at })
    }

    /// Subject of a valid, unexpired token.
    pub fn validate(&self, token: &str) -> AppResult<String> {
        self.validate_at(token, Utc::now())
    }

    /// Like [`validate`](Self::validate) with an explicit clock. Expired once `now >= exp`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<String> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            AppError::TokenInvalid
        })?;
        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(AppError::TokenInvalid);
        }
        if now.timestamp() >= claims.exp {
            return Err(AppError::TokenExpired);
        }
        Ok(claims.sub)
    }
}
