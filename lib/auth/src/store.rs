//! Credential storage: users, password checks, and named per-user tokens.
//!
//! Each user has at most one value per [`TokenSlot`]. Writes overwrite,
//! so there is never more than one live refresh payload for a user.

use crate::error::{AuthError, StoreError};
use crate::password;
use crate::user::User;
use async_trait::async_trait;
use chrono::Utc;
use listkeeper_core::UserId;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Named token slots kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    /// The current signed access token.
    AccessToken,
    /// The JSON refresh payload (token + expiry).
    RefreshToken,
}

impl TokenSlot {
    /// Returns the persisted slot name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "JwtToken",
            Self::RefreshToken => "JwtRefreshToken",
        }
    }
}

impl std::fmt::Display for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for user and token storage.
///
/// `Err` is reserved for environment faults. `set_token` and `remove_token`
/// return `Ok(false)` when the store declined the write, which callers treat
/// as an expected persistence failure.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>>;

    /// Looks up a user by username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<User>, Report<StoreError>>;

    /// Checks a password against the user's stored hash.
    async fn verify_password(
        &self,
        user: &User,
        password: &str,
    ) -> Result<bool, Report<StoreError>> {
        Ok(password::verify_password(password, user.password_hash()))
    }

    /// Reads a named token for a user.
    async fn get_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
    ) -> Result<Option<String>, Report<StoreError>>;

    /// Writes (overwrites) a named token for a user.
    async fn set_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
        value: &str,
    ) -> Result<bool, Report<StoreError>>;

    /// Removes a named token. Returns `false` if nothing was removed.
    async fn remove_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
    ) -> Result<bool, Report<StoreError>>;
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    tokens: HashMap<(UserId, TokenSlot), String>,
}

/// In-process credential store.
///
/// Used by tests and by single-process clients that keep their own token
/// slots. Writes can be made to decline (`reject_writes`) or the whole store
/// made to fault (`set_unavailable`) to exercise failure paths.
pub struct InMemoryCredentialStore {
    inner: Mutex<Inner>,
    next_id: AtomicI64,
    reject_writes: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicI64::new(1),
            reject_writes: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Registers a user with a freshly hashed password.
    pub fn insert_user(
        &self,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, Report<AuthError>> {
        let id = UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.insert_user_with_id(id, username, password, first_name, last_name)
    }

    /// Registers a user under a specific ID.
    pub fn insert_user_with_id(
        &self,
        id: UserId,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, Report<AuthError>> {
        let hash = password::hash_password(password)?;
        let user = User::with_all_fields(
            id,
            username.to_string(),
            hash,
            first_name.to_string(),
            last_name.to_string(),
            Utc::now(),
        );
        let mut inner = self.lock().map_err(|e| {
            e.context(AuthError::Store {
                operation: "insert_user",
            })
        })?;
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    /// Makes subsequent token writes and removals return `false`.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, Report<StoreError>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                details: "store marked unavailable".to_string(),
            }
            .into());
        }
        self.inner.lock().map_err(|_| {
            StoreError::Unavailable {
                details: "store lock poisoned".to_string(),
            }
            .into()
        })
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, Report<StoreError>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn get_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
    ) -> Result<Option<String>, Report<StoreError>> {
        Ok(self.lock()?.tokens.get(&(user_id, slot)).cloned())
    }

    async fn set_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
        value: &str,
    ) -> Result<bool, Report<StoreError>> {
        let mut inner = self.lock()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        inner.tokens.insert((user_id, slot), value.to_string());
        Ok(true)
    }

    async fn remove_token(
        &self,
        user_id: UserId,
        slot: TokenSlot,
    ) -> Result<bool, Report<StoreError>> {
        let mut inner = self.lock()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(inner.tokens.remove(&(user_id, slot)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_match_persisted_form() {
        assert_eq!(TokenSlot::AccessToken.as_str(), "JwtToken");
        assert_eq!(TokenSlot::RefreshToken.as_str(), "JwtRefreshToken");
    }

    #[tokio::test]
    async fn insert_and_find_user() {
        let store = InMemoryCredentialStore::new();
        let user = store
            .insert_user("alice", "pw", "Alice", "Liddell")
            .expect("insert");

        let by_id = store.find_by_id(user.id()).await.expect("lookup");
        assert_eq!(by_id.as_ref().map(User::username), Some("alice"));

        let by_name = store.find_by_username("alice").await.expect("lookup");
        assert_eq!(by_name.map(|u| u.id()), Some(user.id()));

        assert!(store.find_by_username("bob").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn verify_password_uses_stored_hash() {
        let store = InMemoryCredentialStore::new();
        let user = store.insert_user("alice", "pw", "A", "L").expect("insert");
        assert!(store.verify_password(&user, "pw").await.expect("verify"));
        assert!(!store.verify_password(&user, "nope").await.expect("verify"));
    }

    #[tokio::test]
    async fn set_token_overwrites() {
        let store = InMemoryCredentialStore::new();
        let id = UserId::new(1);
        assert!(store.set_token(id, TokenSlot::AccessToken, "a").await.expect("set"));
        assert!(store.set_token(id, TokenSlot::AccessToken, "b").await.expect("set"));
        assert_eq!(
            store.get_token(id, TokenSlot::AccessToken).await.expect("get"),
            Some("b".to_string())
        );
        assert!(
            store
                .get_token(id, TokenSlot::RefreshToken)
                .await
                .expect("get")
                .is_none()
        );
    }

    #[tokio::test]
    async fn remove_token_reports_absence() {
        let store = InMemoryCredentialStore::new();
        let id = UserId::new(1);
        assert!(!store.remove_token(id, TokenSlot::AccessToken).await.expect("remove"));
        store.set_token(id, TokenSlot::AccessToken, "a").await.expect("set");
        assert!(store.remove_token(id, TokenSlot::AccessToken).await.expect("remove"));
    }

    #[tokio::test]
    async fn rejected_writes_return_false() {
        let store = InMemoryCredentialStore::new();
        store.reject_writes(true);
        let id = UserId::new(1);
        assert!(!store.set_token(id, TokenSlot::AccessToken, "a").await.expect("set"));
        assert!(store.get_token(id, TokenSlot::AccessToken).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn unavailable_store_faults() {
        let store = InMemoryCredentialStore::new();
        store.set_unavailable(true);
        assert!(store.find_by_id(UserId::new(1)).await.is_err());
    }
}
