//! API error responses.
//!
//! Every failure leaves the server as JSON `{error, message, timestamp}`.
//! Internal details are logged, never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use listkeeper_auth::{AuthError, ChallengeBody};
use listkeeper_authz::AuthzError;
use rootcause::prelude::Report;
use std::fmt;
use tracing::error;

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The resource does not exist or the caller may not see it.
    NotFound,
    /// The request is malformed or violates a rule.
    BadRequest { message: String },
    /// The request conflicts with existing data.
    Conflict { message: String },
    /// Credentials were refused.
    AuthFailed,
    /// Something went wrong on our side.
    Internal,
}

impl ApiError {
    /// Creates a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::AuthFailed => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Conflict { .. } => "CONFLICT",
            Self::AuthFailed => "AUTH_FAILED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NotFound => "Resource not found".to_string(),
            Self::BadRequest { message } | Self::Conflict { message } => message.clone(),
            Self::AuthFailed => "Authentication failed".to_string(),
            Self::Internal => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ChallengeBody {
            error: self.code().to_string(),
            message: self.message(),
            timestamp: Utc::now(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        error!(error = %e, "database error");
        Self::Internal
    }
}

impl From<Report<AuthError>> for ApiError {
    fn from(report: Report<AuthError>) -> Self {
        error!(error = %report, "token operation failed");
        Self::Internal
    }
}

impl From<Report<AuthzError>> for ApiError {
    fn from(report: Report<AuthzError>) -> Self {
        error!(error = %report, "authorization lookup failed");
        Self::Internal
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn not_found_shape() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "NOT_FOUND");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn bad_request_carries_message() {
        let response = ApiError::bad_request("Owner cannot be assigned").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Owner cannot be assigned");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::from(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Internal server error");
    }
}
