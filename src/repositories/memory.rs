//! Process-local user store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::UserStore;
use crate::error::{AppError, AppResult};
use crate::models::{normalize_email, NewUser, UserId, UserRecord};

/// In-memory user store. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    next_id: UserId,
    users_by_email: HashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                users_by_email: HashMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users_by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let email = normalize_email(&user.email);

        // Existence check, id assignment and insert share one write lock.
        let mut inner = self.inner.write().await;
        if inner.users_by_email.contains_key(&email) {
            debug!(email = %email, "duplicate email rejected");
            return Err(AppError::DuplicateEmail);
        }

        let now = Utc::now();
        let record = UserRecord {
            id: inner.next_id,
            email: email.clone(),
            first_name: user.first_name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.next_id += 1;
        inner.users_by_email.insert(email, record.clone());
        debug!(user_id = record.id, "user created");
        Ok(record)
    }

    async fn lookup_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let email = normalize_email(email);
        Ok(self.inner.read().await.users_by_email.get(&email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str, first_name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_timestamps() {
        let store = InMemoryUserStore::new();
        let first = store.create(new_user("a@x.com", "Ann")).await.unwrap();
        let second = store.create(new_user("b@x.com", "Bob")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_after_normalization() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com", "Ann")).await.unwrap();
        let err = store.create(new_user("  A@X.com", "Ann2")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        // A failed create consumes no id.
        let next = store.create(new_user("c@x.com", "Cid")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn lookup_distinguishes_missing_from_present() {
        let store = InMemoryUserStore::new();
        assert!(store.lookup_by_email("a@x.com").await.unwrap().is_none());
        store.create(new_user("a@x.com", "Ann")).await.unwrap();
        let found = store.lookup_by_email("A@x.com ").await.unwrap().unwrap();
        assert_eq!(found.first_name, "Ann");
        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_for_one_email_yield_one_success() {
        let store = Arc::new(InMemoryUserStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(new_user("race@x.com", &format!("R{}", i))).await
            }));
        }

        let mut ok = 0;
        let mut dup = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::DuplicateEmail) => dup += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(dup, 15);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_distinct_creates_get_unique_ids() {
        let store = Arc::new(InMemoryUserStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(new_user(&format!("u{}@x.com", i), "U"))
                    .await
                    .map(|u| u.id)
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=32).collect::<Vec<_>>());
    }
}
