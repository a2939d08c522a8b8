//! PostgreSQL connection pool.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = sqlx::PgPool;

/// Connect eagerly so a bad `DATABASE_URL` fails at startup, not on the first signup.
///
/// `store_timeout` bounds pool acquisition. Each session also gets a
/// `statement_timeout` just under it, so the server abandons a statement
/// before the caller's deadline drops the query.
pub async fn create_pool(database_url: &str, store_timeout: Duration) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?.options([(
        "statement_timeout",
        statement_timeout_ms(store_timeout).to_string(),
    )]);
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(store_timeout)
        .connect_with(options)
        .await
}

/// 90% of the store deadline, at least 1 ms (0 would disable the timeout).
fn statement_timeout_ms(store_timeout: Duration) -> u64 {
    let ms = u64::try_from(store_timeout.as_millis()).unwrap_or(u64::MAX);
    (ms - ms / 10).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_timeout_stays_under_store_deadline() {
        assert_eq!(statement_timeout_ms(Duration::from_secs(5)), 4500);
        assert_eq!(statement_timeout_ms(Duration::from_millis(100)), 90);
        assert_eq!(statement_timeout_ms(Duration::from_millis(1)), 1);
        assert_eq!(statement_timeout_ms(Duration::ZERO), 1);
        for ms in [10u64, 250, 5_000, 60_000] {
            assert!(statement_timeout_ms(Duration::from_millis(ms)) < ms);
        }
    }
}
