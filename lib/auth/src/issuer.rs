//! Access/refresh token issuance and rotation.
//!
//! The issuer verifies credentials against a [`CredentialStore`], mints an
//! access token plus an opaque refresh token, and persists both into the
//! user's token slots. Every successful refresh overwrites both slots, so the
//! presented refresh token can never be used twice.
//!
//! Credential failures never escape as errors: they return `None`/`false` and
//! emit a warning that names the user but never the password or token.
//! Store faults are logged and propagated.
//!
//! Concurrent refreshes for one user are not serialized here. Two callers
//! presenting the same token race; whichever overwrites second wins, and a
//! caller arriving after the first rotation finds a mismatch.

use crate::config::JwtConfig;
use crate::error::{AuthError, StoreError};
use crate::store::{CredentialStore, TokenSlot};
use crate::token::{AccessClaims, RefreshTokenPayload, TokenPair, TokenSigner};
use crate::user::User;
use chrono::Utc;
use listkeeper_core::UserId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Username/password credentials presented at login.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Wraps a store fault as an issuance error after logging it.
fn store_fault(operation: &'static str) -> impl FnOnce(Report<StoreError>) -> Report<AuthError> {
    move |report| {
        error!(operation, error = %report, "credential store failure");
        report.context(AuthError::Store { operation })
    }
}

/// Issues, rotates, and revokes tokens for users in a [`CredentialStore`].
pub struct TokenIssuer<S> {
    store: Arc<S>,
    config: JwtConfig,
    signer: TokenSigner,
}

impl<S: CredentialStore> TokenIssuer<S> {
    /// Creates an issuer over a store.
    #[must_use]
    pub fn new(store: Arc<S>, config: JwtConfig) -> Self {
        let signer = TokenSigner::new(&config);
        Self {
            store,
            config,
            signer,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the token configuration.
    #[must_use]
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Authenticates a username/password and issues a token pair.
    ///
    /// Returns `Ok(None)` for an unknown user or a wrong password; the two
    /// cases are indistinguishable to the caller.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<Option<TokenPair>, Report<AuthError>> {
        let user = self
            .store
            .find_by_username(&request.username)
            .await
            .map_err(store_fault("find_by_username"))?;

        let Some(user) = user else {
            warn!(username = %request.username, "login failed: unknown user or bad password");
            return Ok(None);
        };

        let verified = self
            .store
            .verify_password(&user, &request.password)
            .await
            .map_err(store_fault("verify_password"))?;
        if !verified {
            warn!(username = %request.username, "login failed: unknown user or bad password");
            return Ok(None);
        }

        let pair = self.issue_pair(&user).await?;
        if pair.is_some() {
            info!(user_id = %user.id(), "user logged in");
        }
        Ok(pair)
    }

    /// Exchanges a refresh token for a brand-new token pair.
    ///
    /// Returns `Ok(None)` if the user is unknown, no payload is stored, the
    /// payload is unreadable, the token does not match exactly, or the payload
    /// has expired (expiry equal to now counts as expired).
    #[instrument(skip(self, presented))]
    pub async fn refresh_tokens(
        &self,
        user_id: UserId,
        presented: &str,
    ) -> Result<Option<TokenPair>, Report<AuthError>> {
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(store_fault("find_by_id"))?;
        let Some(user) = user else {
            warn!(%user_id, "refresh failed: unknown user");
            return Ok(None);
        };

        let stored = self
            .store
            .get_token(user_id, TokenSlot::RefreshToken)
            .await
            .map_err(store_fault("get_token"))?;
        let Some(payload) = stored.as_deref().and_then(RefreshTokenPayload::from_json) else {
            warn!(%user_id, "refresh failed: no usable refresh token stored");
            return Ok(None);
        };

        if payload.token() != presented {
            warn!(%user_id, "refresh failed: refresh token mismatch");
            return Ok(None);
        }

        if payload.is_expired_at(Utc::now()) {
            warn!(%user_id, expired_at = %payload.expires_at(), "refresh failed: refresh token expired");
            return Ok(None);
        }

        let pair = self.issue_pair(&user).await?;
        if pair.is_some() {
            info!(%user_id, "tokens refreshed");
        }
        Ok(pair)
    }

    /// Removes the user's access token slot.
    ///
    /// The refresh token slot is left untouched.
    #[instrument(skip(self, access_token))]
    pub async fn logout(
        &self,
        user_id: UserId,
        access_token: &str,
    ) -> Result<bool, Report<AuthError>> {
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(store_fault("find_by_id"))?;
        if user.is_none() {
            warn!(%user_id, "logout failed: unknown user");
            return Ok(false);
        }

        let stored = self
            .store
            .get_token(user_id, TokenSlot::AccessToken)
            .await
            .map_err(store_fault("get_token"))?;
        if stored.as_deref().is_some_and(|t| t != access_token) {
            debug!(%user_id, "logout presented a token other than the stored one");
        }

        let removed = self
            .store
            .remove_token(user_id, TokenSlot::AccessToken)
            .await
            .map_err(store_fault("remove_token"))?;
        if removed {
            info!(%user_id, "user logged out");
        } else {
            warn!(%user_id, "logout failed: access token slot not removed");
        }
        Ok(removed)
    }

    /// Mints a pair for a verified user and persists both slots.
    ///
    /// The slots are written one after the other; a write declined by the
    /// store yields `Ok(None)`.
    async fn issue_pair(&self, user: &User) -> Result<Option<TokenPair>, Report<AuthError>> {
        let now = Utc::now();
        let claims = AccessClaims::for_user(user, &self.config, now);
        let access_token = self
            .signer
            .sign(&claims)
            .map_err(|e| AuthError::TokenSigning {
                reason: e.to_string(),
            })?;

        let payload = RefreshTokenPayload::issue(now, self.config.refresh_token_lifetime());
        let payload_json = payload.to_json().map_err(|e| AuthError::TokenSigning {
            reason: e.to_string(),
        })?;

        let user_id = user.id();
        if !self
            .store
            .set_token(user_id, TokenSlot::AccessToken, &access_token)
            .await
            .map_err(store_fault("set_token"))?
        {
            warn!(%user_id, slot = %TokenSlot::AccessToken, "token slot write declined");
            return Ok(None);
        }

        if !self
            .store
            .set_token(user_id, TokenSlot::RefreshToken, &payload_json)
            .await
            .map_err(store_fault("set_token"))?
        {
            warn!(%user_id, slot = %TokenSlot::RefreshToken, "token slot write declined");
            return Ok(None);
        }

        Ok(Some(TokenPair {
            access_token,
            refresh_token: payload.token().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;
    use crate::validator::TokenValidator;
    use chrono::Duration;

    fn config() -> JwtConfig {
        JwtConfig::new(
            "listkeeper".to_string(),
            "listkeeper-api".to_string(),
            "test-signing-secret-with-enough-length".to_string(),
        )
    }

    fn issuer_with_alice() -> (TokenIssuer<InMemoryCredentialStore>, User) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let user = store
            .insert_user_with_id(UserId::new(42), "alice", "correct horse", "Alice", "Liddell")
            .expect("insert");
        (TokenIssuer::new(store, config()), user)
    }

    async fn login_alice(issuer: &TokenIssuer<InMemoryCredentialStore>) -> TokenPair {
        issuer
            .login(&LoginRequest::new("alice", "correct horse"))
            .await
            .expect("login")
            .expect("valid credentials")
    }

    #[tokio::test]
    async fn login_issues_pair_and_persists_slots() {
        let (issuer, user) = issuer_with_alice();
        let pair = login_alice(&issuer).await;

        let claims = TokenValidator::new(&config())
            .validate(&pair.access_token)
            .expect("valid access token");
        assert_eq!(claims.nameid, "42");
        assert_eq!(claims.name, "alice");
        assert_eq!(pair.refresh_token.len(), 44);

        let stored_access = issuer
            .store()
            .get_token(user.id(), TokenSlot::AccessToken)
            .await
            .expect("get");
        assert_eq!(stored_access.as_deref(), Some(pair.access_token.as_str()));

        let stored_refresh = issuer
            .store()
            .get_token(user.id(), TokenSlot::RefreshToken)
            .await
            .expect("get")
            .and_then(|raw| RefreshTokenPayload::from_json(&raw))
            .expect("payload");
        assert_eq!(stored_refresh.token(), pair.refresh_token);
        let lifetime = stored_refresh.expires_at() - Utc::now();
        assert!(lifetime > Duration::days(29) && lifetime <= Duration::days(30));
    }

    #[tokio::test]
    async fn login_with_wrong_password_returns_none() {
        let (issuer, _) = issuer_with_alice();
        let result = issuer
            .login(&LoginRequest::new("alice", "wrong"))
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn login_with_unknown_user_returns_none() {
        let (issuer, _) = issuer_with_alice();
        let result = issuer
            .login(&LoginRequest::new("mallory", "correct horse"))
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_rotates_refresh_token() {
        let (issuer, user) = issuer_with_alice();
        let first = login_alice(&issuer).await;

        let second = issuer
            .refresh_tokens(user.id(), &first.refresh_token)
            .await
            .expect("no fault")
            .expect("refreshed");
        assert_ne!(second.refresh_token, first.refresh_token);

        // The rotated-out token is now rejected.
        let replay = issuer
            .refresh_tokens(user.id(), &first.refresh_token)
            .await
            .expect("no fault");
        assert!(replay.is_none());

        // The new one still works.
        assert!(
            issuer
                .refresh_tokens(user.id(), &second.refresh_token)
                .await
                .expect("no fault")
                .is_some()
        );
    }

    #[tokio::test]
    async fn back_to_back_refresh_with_same_token_fails_second_time() {
        let (issuer, user) = issuer_with_alice();
        let pair = login_alice(&issuer).await;

        let first = issuer.refresh_tokens(user.id(), &pair.refresh_token).await;
        let second = issuer.refresh_tokens(user.id(), &pair.refresh_token).await;
        assert!(first.expect("no fault").is_some());
        assert!(second.expect("no fault").is_none());
    }

    #[tokio::test]
    async fn refresh_with_mismatched_token_returns_none() {
        let (issuer, user) = issuer_with_alice();
        login_alice(&issuer).await;
        let result = issuer
            .refresh_tokens(user.id(), "not-the-stored-token")
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_for_unknown_user_returns_none() {
        let (issuer, _) = issuer_with_alice();
        let pair = login_alice(&issuer).await;
        let result = issuer
            .refresh_tokens(UserId::new(7), &pair.refresh_token)
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_without_stored_payload_returns_none() {
        let (issuer, user) = issuer_with_alice();
        let result = issuer
            .refresh_tokens(user.id(), "anything")
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_with_unparsable_payload_returns_none() {
        let (issuer, user) = issuer_with_alice();
        issuer
            .store()
            .set_token(user.id(), TokenSlot::RefreshToken, "{garbage")
            .await
            .expect("set");
        let result = issuer
            .refresh_tokens(user.id(), "{garbage")
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_with_expired_payload_returns_none() {
        let (issuer, user) = issuer_with_alice();
        let expired = RefreshTokenPayload::new(
            "expired-token".to_string(),
            Utc::now() - Duration::seconds(1),
        );
        issuer
            .store()
            .set_token(
                user.id(),
                TokenSlot::RefreshToken,
                &expired.to_json().expect("json"),
            )
            .await
            .expect("set");

        let result = issuer
            .refresh_tokens(user.id(), "expired-token")
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn declined_write_fails_login_without_error() {
        let (issuer, _) = issuer_with_alice();
        issuer.store().reject_writes(true);
        let result = issuer
            .login(&LoginRequest::new("alice", "correct horse"))
            .await
            .expect("no fault");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn store_fault_propagates() {
        let (issuer, _) = issuer_with_alice();
        issuer.store().set_unavailable(true);
        let result = issuer
            .login(&LoginRequest::new("alice", "correct horse"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn logout_removes_access_slot_only() {
        let (issuer, user) = issuer_with_alice();
        let pair = login_alice(&issuer).await;

        assert!(
            issuer
                .logout(user.id(), &pair.access_token)
                .await
                .expect("no fault")
        );
        assert!(
            issuer
                .store()
                .get_token(user.id(), TokenSlot::AccessToken)
                .await
                .expect("get")
                .is_none()
        );

        // The refresh token outlives logout.
        assert!(
            issuer
                .refresh_tokens(user.id(), &pair.refresh_token)
                .await
                .expect("no fault")
                .is_some()
        );
    }

    #[tokio::test]
    async fn logout_of_unknown_user_or_empty_slot_is_false() {
        let (issuer, user) = issuer_with_alice();
        assert!(
            !issuer
                .logout(UserId::new(99), "token")
                .await
                .expect("no fault")
        );
        assert!(!issuer.logout(user.id(), "token").await.expect("no fault"));
    }
}
