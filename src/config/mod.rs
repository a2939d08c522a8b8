//! Application configuration loaded from environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Minimum accepted length (bytes) of `JWT_SECRET`.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime: one year.
pub const MAX_ACCESS_TOKEN_EXP_MINUTES: u64 = 366 * 24 * 60;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3000`).
    pub server_addr: SocketAddr,
    /// PostgreSQL connection URL. When unset the in-memory user store is used.
    pub database_url: Option<String>,
    /// Token signing settings.
    pub jwt: JwtConfig,
    /// Minimum password length in characters.
    pub password_min_length: usize,
    /// Argon2 cost parameters.
    pub hasher: HasherConfig,
    /// Deadline for a single user store call.
    pub store_timeout: Duration,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing secret (min 32 bytes).
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let secret = lookup("JWT_SECRET").ok_or(ConfigLoadError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigLoadError::WeakJwtSecret);
        }
        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(name) => parse_hmac_algorithm(&name)?,
            None => Algorithm::HS256,
        };
        let ttl_minutes: u64 = parse_or("ACCESS_TOKEN_EXP_MINUTES", &lookup, 30)?;
        if ttl_minutes == 0 || ttl_minutes > MAX_ACCESS_TOKEN_EXP_MINUTES {
            return Err(ConfigLoadError::Invalid("ACCESS_TOKEN_EXP_MINUTES"));
        }
        let ttl_secs = ttl_minutes
            .checked_mul(60)
            .ok_or(ConfigLoadError::Invalid("ACCESS_TOKEN_EXP_MINUTES"))?;

        let password_min_length: usize = parse_or("PASSWORD_MIN_LENGTH", &lookup, 8)?;
        if password_min_length == 0 {
            return Err(ConfigLoadError::Invalid("PASSWORD_MIN_LENGTH"));
        }

        let defaults = HasherConfig::default();
        let hasher = HasherConfig {
            memory_kib: parse_or("ARGON2_MEMORY_KIB", &lookup, defaults.memory_kib)?,
            iterations: parse_or("ARGON2_ITERATIONS", &lookup, defaults.iterations)?,
            parallelism: parse_or("ARGON2_PARALLELISM", &lookup, defaults.parallelism)?,
        };

        let store_timeout_ms: u64 = parse_or("STORE_TIMEOUT_MS", &lookup, 5000)?;
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            server_addr,
            database_url,
            jwt: JwtConfig {
                secret,
                algorithm,
                access_ttl: Duration::from_secs(ttl_secs),
            },
            password_min_length,
            hasher,
            store_timeout: Duration::from_millis(store_timeout_ms),
            log_level,
        })
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigLoadError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigLoadError::Invalid(key)),
        None => Ok(default),
    }
}

/// Only shared-secret algorithms make sense with a single `JWT_SECRET`.
fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, ConfigLoadError> {
    match Algorithm::from_str(name.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigLoadError::UnsupportedAlgorithm(name.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,
    #[error("Missing required variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {0}")]
    Invalid(&'static str),
    #[error("JWT_SECRET must be at least 32 bytes")]
    WeakJwtSecret,
    #[error("Unsupported JWT_ALGORITHM {0}: expected HS256, HS384 or HS512")]
    UnsupportedAlgorithm(String),
}
