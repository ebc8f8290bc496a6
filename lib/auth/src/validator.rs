//! Inbound bearer token validation.
//!
//! Checks issuer, audience, signature, and lifetime (with the configured
//! clock skew) and classifies every failure into one of four rejection codes
//! so the HTTP layer can answer with a structured 401.

use crate::config::JwtConfig;
use crate::session::AuthenticatedSession;
use crate::token::{ACCESS_TOKEN_ALGORITHM, AccessClaims};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Why a bearer token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    /// The token's lifetime has passed.
    Expired,
    /// The signature does not verify with the configured secret.
    InvalidSignature,
    /// Any other validation failure (issuer, audience, format, claims).
    InvalidToken { reason: String },
    /// No usable credentials were presented.
    AuthFailed,
}

impl TokenRejection {
    /// Returns the machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Expired => "TOKEN_EXPIRED",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::AuthFailed => "AUTH_FAILED",
        }
    }

    /// Returns the human-readable message sent to clients.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Expired => "The access token has expired",
            Self::InvalidSignature => "The access token signature is invalid",
            Self::InvalidToken { .. } => "The access token is invalid",
            Self::AuthFailed => "Authentication failed",
        }
    }

    /// Returns true when refreshing and retrying is worthwhile.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Builds the JSON challenge body for this rejection.
    #[must_use]
    pub fn challenge(&self, timestamp: DateTime<Utc>) -> ChallengeBody {
        ChallengeBody {
            error: self.code().to_string(),
            message: self.message().to_string(),
            timestamp,
        }
    }
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken { reason } => write!(f, "{}: {reason}", self.code()),
            _ => write!(f, "{}", self.code()),
        }
    }
}

impl std::error::Error for TokenRejection {}

/// Body of a 401 challenge response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeBody {
    /// Rejection code.
    pub error: String,
    /// Human-readable text.
    pub message: String,
    /// When the rejection happened (RFC 3339).
    pub timestamp: DateTime<Utc>,
}

/// The claims compared before the signature is trusted.
#[derive(Deserialize)]
struct Scope {
    iss: Option<String>,
    aud: Option<String>,
}

/// Validates access tokens against a [`JwtConfig`].
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl TokenValidator {
    /// Creates a validator for the configured issuer, audience, and secret.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(ACCESS_TOKEN_ALGORITHM);
        validation.set_issuer(&[config.issuer()]);
        validation.set_audience(&[config.audience()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = config.clock_skew_seconds();

        Self {
            key: DecodingKey::from_secret(config.secret()),
            validation,
            issuer: config.issuer().to_string(),
            audience: config.audience().to_string(),
        }
    }

    /// Verifies a raw token and returns its claims.
    ///
    /// Failures are reported in check order: issuer, audience, signature,
    /// then lifetime. A foreign token is never reported as expired.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, TokenRejection> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "access token rejected");
                self.classify(token, &e)
            })
    }

    fn classify(&self, token: &str, error: &jsonwebtoken::errors::Error) -> TokenRejection {
        if let Ok(data) = jsonwebtoken::dangerous::insecure_decode::<Scope>(token) {
            if data.claims.iss.as_deref() != Some(self.issuer.as_str()) {
                return TokenRejection::InvalidToken {
                    reason: "issuer mismatch".to_string(),
                };
            }
            if data.claims.aud.as_deref() != Some(self.audience.as_str()) {
                return TokenRejection::InvalidToken {
                    reason: "audience mismatch".to_string(),
                };
            }
        }
        match error.kind() {
            ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            _ => TokenRejection::InvalidToken {
                reason: error.to_string(),
            },
        }
    }

    /// Verifies a raw token and builds the session context.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedSession, TokenRejection> {
        let claims = self.validate(token)?;
        AuthenticatedSession::from_claims(&claims).map_err(|e| TokenRejection::InvalidToken {
            reason: e.to_string(),
        })
    }

    /// Authenticates an `Authorization` header value (`Bearer <token>`).
    ///
    /// The scheme is matched case-insensitively. A missing header or a
    /// non-bearer scheme is [`TokenRejection::AuthFailed`].
    pub fn authenticate_header(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedSession, TokenRejection> {
        let token = header
            .and_then(|value| value.trim_start().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or(TokenRejection::AuthFailed)?;
        self.authenticate(token)
    }
}
