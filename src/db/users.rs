//! PostgreSQL-backed user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{debug, info};

use super::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{normalize_email, NewUser, UserRecord};
use crate::repositories::UserStore;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    first_name    TEXT NOT NULL,
    password_hash TEXT NOT NULL CHECK (password_hash <> ''),
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    first_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// User store on a `users` table. Email uniqueness is enforced by the
/// table's UNIQUE constraint, ids by its sequence.
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table when it does not exist yet.
    pub async fn init_schema(&self) -> AppResult<()> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        info!("users table ready");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let email = normalize_email(&user.email);
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, first_name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, first_name, password_hash, created_at, updated_at
            "#,
        )
        .bind(&email)
        .bind(&user.first_name)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                debug!(user_id = row.id, "user created");
                Ok(row.into())
            }
            None => {
                debug!(email = %email, "duplicate email rejected");
                Err(AppError::DuplicateEmail)
            }
        }
    }

    async fn lookup_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, first_name, password_hash, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }
}
