//! User store abstraction and the in-memory implementation.

mod memory;

pub use memory::InMemoryUserStore;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{NewUser, UserRecord};

/// Storage for user records, keyed by normalized email.
///
/// Implementations must make `create` atomic per email: of two concurrent
/// creates for the same email exactly one succeeds and the other returns
/// `AppError::DuplicateEmail`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, assigning the next id and setting both timestamps to now.
    async fn create(&self, user: NewUser) -> AppResult<UserRecord>;

    /// `Ok(None)` when no user has this email; `Err` only for store failures.
    async fn lookup_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;
}
