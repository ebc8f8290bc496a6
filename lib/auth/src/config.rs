//! JWT signing and validation configuration.
//!
//! The same configuration is consumed by the issuer (to sign) and the
//! validator (to verify), so a token minted with one `JwtConfig` is accepted
//! by a validator built from an equal one.

use crate::error::JwtConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for access and refresh tokens.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Value of the `iss` claim, required to match on validation.
    issuer: String,
    /// Value of the `aud` claim, required to match on validation.
    audience: String,
    /// Symmetric HMAC-SHA-512 signing secret.
    secret: String,
    /// Access token lifetime in hours.
    /// Default: 24
    #[serde(default = "default_access_token_hours")]
    access_token_hours: i64,
    /// Refresh token lifetime in days.
    /// Default: 30
    #[serde(default = "default_refresh_token_days")]
    refresh_token_days: i64,
    /// Clock skew tolerated when checking `exp`/`nbf`, in seconds.
    /// Default: 300
    #[serde(default = "default_clock_skew_seconds")]
    clock_skew_seconds: u64,
}

/// Longest accepted access token lifetime (one year).
pub const MAX_ACCESS_TOKEN_HOURS: i64 = 24 * 365;

/// Longest accepted refresh token lifetime (ten years).
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 365 * 10;

fn default_access_token_hours() -> i64 {
    24
}

fn default_refresh_token_days() -> i64 {
    30
}

fn default_clock_skew_seconds() -> u64 {
    300
}

impl JwtConfig {
    /// Creates a new configuration with default lifetimes and skew.
    #[must_use]
    pub fn new(issuer: String, audience: String, secret: String) -> Self {
        Self {
            issuer,
            audience,
            secret,
            access_token_hours: default_access_token_hours(),
            refresh_token_days: default_refresh_token_days(),
            clock_skew_seconds: default_clock_skew_seconds(),
        }
    }

    /// Overrides the access token lifetime.
    #[must_use]
    pub fn with_access_token_hours(mut self, hours: i64) -> Self {
        self.access_token_hours = hours;
        self
    }

    /// Overrides the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_days(mut self, days: i64) -> Self {
        self.refresh_token_days = days;
        self
    }

    /// Overrides the tolerated clock skew.
    #[must_use]
    pub fn with_clock_skew_seconds(mut self, seconds: u64) -> Self {
        self.clock_skew_seconds = seconds;
        self
    }

    /// Checks that every value is usable for signing and validation.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty issuer, audience, or secret, or a
    /// lifetime outside `1..=MAX`.
    pub fn validate(&self) -> Result<(), JwtConfigError> {
        for (field, value) in [
            ("issuer", &self.issuer),
            ("audience", &self.audience),
            ("secret", &self.secret),
        ] {
            if value.trim().is_empty() {
                return Err(JwtConfigError::Empty { field });
            }
        }
        if !(1..=MAX_ACCESS_TOKEN_HOURS).contains(&self.access_token_hours) {
            return Err(JwtConfigError::OutOfRange {
                field: "access_token_hours",
                value: self.access_token_hours,
                max: MAX_ACCESS_TOKEN_HOURS,
            });
        }
        if !(1..=MAX_REFRESH_TOKEN_DAYS).contains(&self.refresh_token_days) {
            return Err(JwtConfigError::OutOfRange {
                field: "refresh_token_days",
                value: self.refresh_token_days,
                max: MAX_REFRESH_TOKEN_DAYS,
            });
        }
        Ok(())
    }

    /// Returns the issuer claim value.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the audience claim value.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Returns the signing secret as bytes.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    /// Returns how long an access token stays valid.
    ///
    /// Values outside the accepted range are clamped.
    #[must_use]
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::hours(self.access_token_hours.clamp(0, MAX_ACCESS_TOKEN_HOURS))
    }

    /// Returns how long a refresh token stays valid.
    ///
    /// Values outside the accepted range are clamped.
    #[must_use]
    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::days(self.refresh_token_days.clamp(0, MAX_REFRESH_TOKEN_DAYS))
    }

    /// Returns the tolerated clock skew in seconds.
    #[must_use]
    pub fn clock_skew_seconds(&self) -> u64 {
        self.clock_skew_seconds
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .field("access_token_hours", &self.access_token_hours)
            .field("refresh_token_days", &self.refresh_token_days)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
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
            "secret-value".to_string(),
        )
    }

    #[test]
    fn new_uses_default_lifetimes() {
        let config = config();
        assert_eq!(config.access_token_lifetime(), Duration::hours(24));
        assert_eq!(config.refresh_token_lifetime(), Duration::days(30));
        assert_eq!(config.clock_skew_seconds(), 300);
    }

    #[test]
    fn deserialize_applies_defaults() {
        let json = r#"{"issuer":"iss","audience":"aud","secret":"s"}"#;
        let config: JwtConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.issuer(), "iss");
        assert_eq!(config.audience(), "aud");
        assert_eq!(config.access_token_lifetime(), Duration::hours(24));
    }

    #[test]
    fn builders_override_values() {
        let config = config()
            .with_access_token_hours(1)
            .with_refresh_token_days(7)
            .with_clock_skew_seconds(0);
        assert_eq!(config.access_token_lifetime(), Duration::hours(1));
        assert_eq!(config.refresh_token_lifetime(), Duration::days(7));
        assert_eq!(config.clock_skew_seconds(), 0);
    }

    #[test]
    fn defaults_pass_validation() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn blank_secret_is_rejected() {
        let config = JwtConfig::new(
            "listkeeper".to_string(),
            "listkeeper-api".to_string(),
            "  ".to_string(),
        );
        assert_eq!(
            config.validate(),
            Err(JwtConfigError::Empty { field: "secret" })
        );
    }

    #[test]
    fn out_of_range_lifetimes_are_rejected() {
        let negative = config().with_access_token_hours(-1);
        assert!(matches!(
            negative.validate(),
            Err(JwtConfigError::OutOfRange {
                field: "access_token_hours",
                ..
            })
        ));

        let huge = config().with_refresh_token_days(i64::MAX);
        assert!(matches!(
            huge.validate(),
            Err(JwtConfigError::OutOfRange {
                field: "refresh_token_days",
                ..
            })
        ));
        assert_eq!(
            huge.refresh_token_lifetime(),
            Duration::days(MAX_REFRESH_TOKEN_DAYS)
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
