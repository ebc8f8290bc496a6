//! A thin API client that routes every request through the refresher.

use crate::backend::RefreshBackend;
use crate::error::ClientError;
use crate::refresher::TokenRefresher;
use listkeeper_auth::{AuthenticatedSession, CredentialStore, LoginRequest, TokenPair};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{instrument, warn};

/// HTTP client for the listkeeper API.
pub struct ApiClient<S, B> {
    http: reqwest::Client,
    base_url: String,
    refresher: Arc<TokenRefresher<S, B>>,
}

impl<S: CredentialStore, B: RefreshBackend> ApiClient<S, B> {
    /// Creates a client for the API at `base_url`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        refresher: Arc<TokenRefresher<S, B>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            refresher,
        }
    }

    /// Starts a request against an API path such as `/api/lists`.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends a request on behalf of an optional session.
    #[instrument(skip_all)]
    pub async fn send(
        &self,
        session: Option<&AuthenticatedSession>,
        builder: RequestBuilder,
    ) -> Result<Response, Report<ClientError>> {
        let request = builder.build().map_err(ClientError::from)?;
        let request = self.refresher.prepare(session, request).await?;
        Ok(self
            .http
            .execute(request)
            .await
            .map_err(ClientError::from)?)
    }

    /// Sends a GET and decodes a JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        session: &AuthenticatedSession,
        path: &str,
    ) -> Result<T, Report<ClientError>> {
        let response = self
            .send(Some(session), self.request(Method::GET, path))
            .await?;
        decode(response).await
    }

    /// Logs in. Returns `None` when the API refuses the credentials.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<Option<TokenPair>, Report<ClientError>> {
        let response = self
            .send(None, self.request(Method::POST, "/api/auth/login").json(request))
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("login refused");
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Report<ClientError>> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    Ok(response.json::<T>().await.map_err(ClientError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HttpRefreshBackend;
    use crate::refresher::RefresherConfig;
    use listkeeper_auth::InMemoryCredentialStore;

    fn client() -> ApiClient<InMemoryCredentialStore, HttpRefreshBackend> {
        let http = reqwest::Client::new();
        let backend = HttpRefreshBackend::new(http.clone(), "http://localhost:3000");
        let refresher = TokenRefresher::new(
            Arc::new(InMemoryCredentialStore::new()),
            backend,
            RefresherConfig::default(),
        );
        ApiClient::new(http, "http://localhost:3000/", Arc::new(refresher))
    }

    #[test]
    fn urls_join_cleanly() {
        let client = client();
        assert_eq!(client.url("/api/lists"), "http://localhost:3000/api/lists");
        assert_eq!(client.url("api/tasks/1"), "http://localhost:3000/api/tasks/1");
    }

    #[test]
    fn request_builder_targets_api() {
        let request = client()
            .request(Method::DELETE, "/api/comments/9")
            .build()
            .expect("request");
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/api/comments/9");
    }
}
