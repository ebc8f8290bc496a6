//! Access token claims, refresh payloads, and token pairs.
//!
//! Access tokens are HS512-signed JWTs carrying the username (`name`) and the
//! stringified user id (`nameid`). Refresh tokens are opaque: 256 random bits,
//! base64-encoded, persisted alongside their expiry as a JSON payload.

use crate::config::JwtConfig;
use crate::user::User;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use listkeeper_core::{ParseIdError, UserId};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signing algorithm for access tokens.
pub const ACCESS_TOKEN_ALGORITHM: Algorithm = Algorithm::HS512;

/// Number of random bytes in a refresh token.
const REFRESH_TOKEN_BYTES: usize = 32;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Username.
    pub name: String,
    /// User ID as a decimal string.
    pub nameid: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Not-before, seconds since the epoch.
    pub nbf: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl AccessClaims {
    /// Builds the claims for a user, issued at `issued_at`.
    #[must_use]
    pub fn for_user(user: &User, config: &JwtConfig, issued_at: DateTime<Utc>) -> Self {
        let expires_at = issued_at + config.access_token_lifetime();
        Self {
            name: user.username().to_string(),
            nameid: user.id().to_string(),
            iss: config.issuer().to_string(),
            aud: config.audience().to_string(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Parses the `nameid` claim into a user ID.
    pub fn user_id(&self) -> Result<UserId, ParseIdError> {
        self.nameid.parse()
    }

    /// Returns the expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs access token claims with the configured secret.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    header: Header,
}

impl TokenSigner {
    /// Creates a signer for the configured secret.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.secret()),
            header: Header::new(ACCESS_TOKEN_ALGORITHM),
        }
    }

    /// Encodes and signs the claims.
    pub fn sign(&self, claims: &AccessClaims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&self.header, claims, &self.key)
    }
}

/// Reads the `exp` claim of a token without verifying its signature.
///
/// Only for a client inspecting a token it was itself issued; never use the
/// result for an access decision.
#[must_use]
pub fn read_expiry_unverified(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct ExpiryOnly {
        exp: i64,
    }

    let data = jsonwebtoken::dangerous::insecure_decode::<ExpiryOnly>(token).ok()?;
    DateTime::from_timestamp(data.claims.exp, 0)
}

/// Generates a new opaque refresh token.
#[must_use]
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// The persisted refresh token state for a user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenPayload {
    token: String,
    expires_at: DateTime<Utc>,
}

impl RefreshTokenPayload {
    /// Creates a payload.
    #[must_use]
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Creates a payload for a fresh token valid for `lifetime` from `now`.
    #[must_use]
    pub fn issue(now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self::new(generate_refresh_token(), now + lifetime)
    }

    /// Returns the opaque token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns when the token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the payload is no longer usable at `now`.
    ///
    /// Expiry is inclusive: a payload expiring exactly at `now` is expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Serializes the payload for the token slot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a stored payload. Returns `None` for malformed or empty tokens.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|payload| !payload.token.is_empty())
    }
}

impl fmt::Debug for RefreshTokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenPayload")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// An access token and its companion refresh token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,
    /// Opaque refresh token.
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new(
            "listkeeper".to_string(),
            "listkeeper-api".to_string(),
            "test-signing-secret-with-enough-length".to_string(),
        )
    }

    fn user() -> User {
        User::with_all_fields(
            UserId::new(42),
            "alice".to_string(),
            String::new(),
            "Alice".to_string(),
            "Liddell".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn claims_carry_name_and_id() {
        let now = Utc::now();
        let claims = AccessClaims::for_user(&user(), &config(), now);
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.nameid, "42");
        assert_eq!(claims.user_id().expect("id"), UserId::new(42));
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn refresh_token_is_256_bits_base64() {
        let token = generate_refresh_token();
        assert_eq!(token.len(), 44);
        let decoded = STANDARD.decode(&token).expect("base64");
        assert_eq!(decoded.len(), 32);
        assert_ne!(token, generate_refresh_token());
    }

    #[test]
    fn payload_expiry_is_inclusive() {
        let now = Utc::now();
        let at_boundary = RefreshTokenPayload::new("t".to_string(), now);
        assert!(at_boundary.is_expired_at(now));

        let later = RefreshTokenPayload::new("t".to_string(), now + Duration::seconds(1));
        assert!(!later.is_expired_at(now));

        let earlier = RefreshTokenPayload::new("t".to_string(), now - Duration::seconds(1));
        assert!(earlier.is_expired_at(now));
    }

    #[test]
    fn payload_json_round_trip_and_rejects_garbage() {
        let payload = RefreshTokenPayload::issue(Utc::now(), Duration::days(30));
        let json = payload.to_json().expect("serialize");
        assert_eq!(RefreshTokenPayload::from_json(&json), Some(payload));

        assert!(RefreshTokenPayload::from_json("not json").is_none());
        assert!(
            RefreshTokenPayload::from_json(r#"{"token":"","expires_at":"2030-01-01T00:00:00Z"}"#)
                .is_none()
        );
    }

    #[test]
    fn unverified_expiry_reads_signed_token() {
        let now = Utc::now();
        let claims = AccessClaims::for_user(&user(), &config(), now);
        let token = TokenSigner::new(&config()).sign(&claims).expect("sign");

        let expiry = read_expiry_unverified(&token).expect("exp");
        assert_eq!(expiry.timestamp(), claims.exp);
    }

    #[test]
    fn unverified_expiry_of_garbage_is_none() {
        assert!(read_expiry_unverified("not.a.jwt").is_none());
        assert!(read_expiry_unverified("").is_none());
    }

    #[test]
    fn debug_redacts_token_values() {
        let pair = TokenPair {
            access_token: "secret-access".to_string(),
            refresh_token: "secret-refresh".to_string(),
        };
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
