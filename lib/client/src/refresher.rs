//! Outgoing request interception with silent access token renewal.
//!
//! Before a request leaves on behalf of a session, the refresher looks up the
//! session user's stored access token. If that token expired more than a
//! minute ago it tries to exchange the stored refresh token for a new pair,
//! persists whatever it got, and attaches the freshest token it has as a
//! bearer header. A failed refresh is not an error: the stale token is sent
//! and the API answers 401.

use crate::backend::RefreshBackend;
use crate::error::ClientError;
use chrono::{DateTime, Duration, Utc};
use listkeeper_auth::{
    AuthenticatedSession, CredentialStore, RefreshTokenPayload, TokenSlot, read_expiry_unverified,
};
use listkeeper_core::UserId;
use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument, warn};

/// Minutes past expiry before a refresh is attempted.
const REFRESH_GRACE_MINUTES: i64 = 1;

/// Refresher behaviour.
#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Serialize refreshes per user within this process.
    ///
    /// When off, two requests for the same user may both present the same
    /// refresh token and the second one loses.
    pub single_flight: bool,
    /// Lifetime recorded for refresh tokens persisted after a refresh.
    pub refresh_token_lifetime: Duration,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            single_flight: false,
            refresh_token_lifetime: Duration::days(30),
        }
    }
}

/// Returns true if a token with expiry `exp` should be refreshed at `now`.
#[must_use]
pub fn needs_refresh(exp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    exp < now - Duration::minutes(REFRESH_GRACE_MINUTES)
}

type UserLocks = Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>;

/// Attaches bearer tokens to outgoing requests, refreshing them when stale.
pub struct TokenRefresher<S, B> {
    store: Arc<S>,
    backend: B,
    config: RefresherConfig,
    in_flight: UserLocks,
}

/// A claim on a user's refresh lock; the map entry goes once nobody holds one.
struct InFlight<'a> {
    locks: &'a UserLocks,
    user_id: UserId,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.user_id);
        }
    }
}

impl<S: CredentialStore, B: RefreshBackend> TokenRefresher<S, B> {
    /// Creates a refresher reading and writing tokens in `store`.
    #[must_use]
    pub fn new(store: Arc<S>, backend: B, config: RefresherConfig) -> Self {
        Self {
            store,
            backend,
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the token store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Prepares a request for sending on behalf of `session`.
    ///
    /// Without a session, or without a stored access token, the request is
    /// returned unmodified.
    #[instrument(skip_all, fields(user_id = session.map(|s| s.user_id().get())))]
    pub async fn prepare(
        &self,
        session: Option<&AuthenticatedSession>,
        mut request: Request,
    ) -> Result<Request, Report<ClientError>> {
        let Some(session) = session else {
            return Ok(request);
        };

        let Some(token) = self.current_token(session.user_id()).await? else {
            debug!("no stored access token; sending without credentials");
            return Ok(request);
        };

        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidHeader)?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(request)
    }

    /// Returns the access token to send for `user_id`, refreshing it if stale.
    pub async fn current_token(
        &self,
        user_id: UserId,
    ) -> Result<Option<String>, Report<ClientError>> {
        let Some(token) = self.stored_access_token(user_id).await? else {
            return Ok(None);
        };
        if !is_stale(&token) {
            return Ok(Some(token));
        }

        if self.config.single_flight {
            let in_flight = self.user_lock(user_id);
            let _guard = in_flight.lock.lock().await;
            // Another request may have refreshed while we waited.
            let Some(token) = self.stored_access_token(user_id).await? else {
                return Ok(None);
            };
            if !is_stale(&token) {
                return Ok(Some(token));
            }
            return self.refresh(user_id, token).await.map(Some);
        }

        self.refresh(user_id, token).await.map(Some)
    }

    async fn refresh(&self, user_id: UserId, stale: String) -> Result<String, Report<ClientError>> {
        let payload = self
            .store
            .get_token(user_id, TokenSlot::RefreshToken)
            .await
            .map_err(|e| {
                e.context(ClientError::Store {
                    operation: "get_refresh_token",
                })
            })?
            .and_then(|raw| RefreshTokenPayload::from_json(&raw));
        let Some(payload) = payload else {
            debug!("no usable refresh token; keeping stale access token");
            return Ok(stale);
        };

        let pair = match self.backend.refresh(user_id, payload.token()).await {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                debug!("refresh refused; keeping stale access token");
                return Ok(stale);
            }
            Err(report) => {
                warn!(error = %report, "refresh failed; keeping stale access token");
                return Ok(stale);
            }
        };

        self.persist(user_id, &pair.access_token, &pair.refresh_token)
            .await;
        debug!("access token refreshed");
        Ok(pair.access_token)
    }

    async fn persist(&self, user_id: UserId, access_token: &str, refresh_token: &str) {
        let payload = RefreshTokenPayload::new(
            refresh_token.to_string(),
            Utc::now() + self.config.refresh_token_lifetime,
        );
        let json = match payload.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "could not encode refresh payload");
                return;
            }
        };

        for (slot, value) in [
            (TokenSlot::AccessToken, access_token),
            (TokenSlot::RefreshToken, json.as_str()),
        ] {
            match self.store.set_token(user_id, slot, value).await {
                Ok(true) => {}
                Ok(false) => warn!(%slot, "token store declined write"),
                Err(report) => warn!(%slot, error = %report, "token store write failed"),
            }
        }
    }

    async fn stored_access_token(
        &self,
        user_id: UserId,
    ) -> Result<Option<String>, Report<ClientError>> {
        self.store
            .get_token(user_id, TokenSlot::AccessToken)
            .await
            .map_err(|e| {
                e.context(ClientError::Store {
                    operation: "get_access_token",
                })
            })
    }

    fn user_lock(&self, user_id: UserId) -> InFlight<'_> {
        let mut locks = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        InFlight {
            locks: &self.in_flight,
            user_id,
            lock: Arc::clone(locks.entry(user_id).or_default()),
        }
    }
}

/// An unreadable token is sent as-is; the API will reject it.
fn is_stale(token: &str) -> bool {
    read_expiry_unverified(token).is_some_and(|exp| needs_refresh(exp, Utc::now()))
}
