//! Auth application service: signup, login and bearer-token resolution.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::auth::hasher::CredentialHasher;
use crate::auth::jwt::{IssuedToken, TokenIssuer};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{normalize_email, NewUser, PublicUser, UserId, UserRecord};
use crate::repositories::UserStore;

pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestrates the user store, the password hasher and the token issuer.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    tokens: TokenIssuer,
    password_min_length: usize,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, tokens: TokenIssuer) -> Self {
        Self {
            store,
            hasher,
            tokens,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Build the hasher and token issuer from `config` around an existing store.
    pub fn from_config(store: Arc<dyn UserStore>, config: &Config) -> AppResult<Self> {
        let hasher = CredentialHasher::new(config.hasher)?;
        let tokens = TokenIssuer::new(&config.jwt)?;
        Ok(Self::new(store, hasher, tokens)
            .with_password_min_length(config.password_min_length)
            .with_store_timeout(config.store_timeout))
    }

    pub fn with_password_min_length(mut self, min: usize) -> Self {
        self.password_min_length = min;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a user. No token is issued.
    pub async fn signup(&self, email: &str, first_name: &str, password: &str) -> AppResult<UserId> {
        if password.chars().count() < self.password_min_length {
            return Err(AppError::WeakPassword);
        }
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::InvalidInput("email must not be empty".to_string()));
        }
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(AppError::InvalidInput("first name must not be empty".to_string()));
        }
        if has_nul(&email) || has_nul(first_name) {
            return Err(AppError::InvalidInput("NUL characters are not allowed".to_string()));
        }

        let hasher = self.hasher.clone();
        let plaintext = password.to_owned();
        let password_hash = run_blocking(move || hasher.hash(&plaintext)).await??;

        let user = self
            .with_deadline(
                "create",
                self.store.create(NewUser {
                    email,
                    first_name: first_name.to_string(),
                    password_hash,
                }),
            )
            .await?;

        info!(user_id = user.id, "user signed up");
        Ok(user.id)
    }

    /// Check credentials and issue a token bound to the user's email.
    ///
    /// Unknown email and wrong password both end in `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(IssuedToken, PublicUser)> {
        let email = normalize_email(email);
        // No stored email contains NUL, and TEXT columns reject it.
        let user = if has_nul(&email) {
            None
        } else {
            self.with_deadline("lookup_by_email", self.store.lookup_by_email(&email))
                .await?
        };

        let user = match user {
            Some(user) => user,
            None => {
                let hasher = self.hasher.clone();
                let plaintext = password.to_owned();
                run_blocking(move || hasher.verify_dummy(&plaintext)).await?;
                warn!(email = %email, "login unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.password_matches(&user, password).await? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.email, Utc::now())?;
        info!(user_id = user.id, "user logged in");
        Ok((token, PublicUser::from(&user)))
    }

    /// Resolve a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> AppResult<PublicUser> {
        let email = self.tokens.validate(token)?;
        let user = self
            .with_deadline("lookup_by_email", self.store.lookup_by_email(&email))
            .await?
            .ok_or_else(|| {
                warn!("token subject no longer resolvable");
                AppError::InvalidCredentials
            })?;
        Ok(PublicUser::from(&user))
    }

    async fn password_matches(&self, user: &UserRecord, password: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let plaintext = password.to_owned();
        let hash = user.password_hash.clone();
        run_blocking(move || hasher.verify(&plaintext, &hash)).await
    }

    /// Bound a store call by `store_timeout`; the call is dropped on elapse.
    async fn with_deadline<T, F>(&self, op: &'static str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.store_timeout.as_millis() as u64, "user store call timed out");
                Err(AppError::StoreUnavailable(format!("{} timed out", op)))
            }
        }
    }
}

fn has_nul(s: &str) -> bool {
    s.contains('\0')
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("blocking task: {}", e)))
}
