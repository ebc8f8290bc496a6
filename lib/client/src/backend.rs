//! Backends that exchange a refresh token for a new token pair.

use crate::error::ClientError;
use async_trait::async_trait;
use listkeeper_auth::{CredentialStore, TokenIssuer, TokenPair};
use listkeeper_core::UserId;
use reqwest::StatusCode;
use rootcause::prelude::Report;
use serde::Serialize;
use tracing::{debug, instrument};

/// Exchanges a refresh token for a new token pair.
///
/// `Ok(None)` means the refresh token was refused.
#[async_trait]
pub trait RefreshBackend: Send + Sync {
    /// Attempts a refresh for `user_id`.
    async fn refresh(
        &self,
        user_id: UserId,
        refresh_token: &str,
    ) -> Result<Option<TokenPair>, Report<ClientError>>;
}

#[async_trait]
impl<S: CredentialStore> RefreshBackend for TokenIssuer<S> {
    async fn refresh(
        &self,
        user_id: UserId,
        refresh_token: &str,
    ) -> Result<Option<TokenPair>, Report<ClientError>> {
        self.refresh_tokens(user_id, refresh_token)
            .await
            .map_err(|e| e.context(ClientError::Refresh))
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    user_id: UserId,
    refresh_token: &'a str,
}

/// Refreshes through the API's `/api/auth/refresh` endpoint.
#[derive(Clone)]
pub struct HttpRefreshBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRefreshBackend {
    /// Creates a backend for the API at `base_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn refresh_url(&self) -> String {
        format!("{}/api/auth/refresh", self.base_url)
    }
}

#[async_trait]
impl RefreshBackend for HttpRefreshBackend {
    #[instrument(skip(self, refresh_token))]
    async fn refresh(
        &self,
        user_id: UserId,
        refresh_token: &str,
    ) -> Result<Option<TokenPair>, Report<ClientError>> {
        let response = self
            .http
            .post(self.refresh_url())
            .json(&RefreshRequest {
                user_id,
                refresh_token,
            })
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!("refresh token refused");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let pair = response
            .json::<TokenPair>()
            .await
            .map_err(ClientError::from)?;
        Ok(Some(pair))
    }
}
