//! Bearer-token gate and authentication extractor for Axum.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use listkeeper_auth::{AuthenticatedSession, TokenRejection, TokenValidator};
use tracing::{debug, warn};

/// Header set on 401 responses caused by an expired access token.
pub const TOKEN_EXPIRED_HEADER: HeaderName = HeaderName::from_static("token-expired");

/// Validates the bearer token and stores the session in request extensions.
///
/// Install with `axum::middleware::from_fn_with_state(validator, require_bearer)`.
pub async fn require_bearer(
    State(validator): State<TokenValidator>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match validator.authenticate_header(header) {
        Ok(session) => {
            debug!(user_id = %session.user_id(), "bearer token accepted");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(rejection) => {
            warn!(code = rejection.code(), error = %rejection, "bearer token rejected");
            AuthRejection(rejection).into_response()
        }
    }
}

/// Extractor for the authenticated session placed by [`require_bearer`].
pub struct RequireAuth(pub AuthenticatedSession);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedSession>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection(TokenRejection::AuthFailed))
    }
}

/// A 401 challenge for a rejected bearer token.
#[derive(Debug)]
pub struct AuthRejection(pub TokenRejection);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = self.0.challenge(Utc::now());
        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        if self.0.is_expired() {
            response
                .headers_mut()
                .insert(TOKEN_EXPIRED_HEADER, HeaderValue::from_static("true"));
        }
        response
    }
}
