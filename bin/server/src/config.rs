//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`JWT__SECRET` sets `jwt.secret`).
//!
//! See [`JwtConfig`] for token signing and validation settings.

use listkeeper_auth::JwtConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Maximum pooled database connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Token configuration.
    pub jwt: JwtConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid,
    /// including token settings rejected by [`JwtConfig::validate`].
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::default())
    }

    fn from_source(env: config::Environment) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config
            .jwt
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    #[test]
    fn loads_with_defaults() {
        let config = ServerConfig::from_source(env(&[
            ("DATABASE_URL", "postgres://localhost/listkeeper"),
            ("JWT__ISSUER", "listkeeper"),
            ("JWT__AUDIENCE", "listkeeper-api"),
            ("JWT__SECRET", "a-long-enough-signing-secret"),
        ]))
        .expect("config");

        assert_eq!(config.database_url, "postgres://localhost/listkeeper");
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.jwt.issuer(), "listkeeper");
        assert_eq!(config.jwt.audience(), "listkeeper-api");
        assert_eq!(config.jwt.clock_skew_seconds(), 300);
        assert_eq!(config.jwt.access_token_lifetime(), chrono::Duration::hours(24));
    }

    #[test]
    fn overrides_token_lifetimes() {
        let config = ServerConfig::from_source(env(&[
            ("DATABASE_URL", "postgres://localhost/listkeeper"),
            ("LISTEN_ADDR", "0.0.0.0:8080"),
            ("JWT__ISSUER", "listkeeper"),
            ("JWT__AUDIENCE", "listkeeper-api"),
            ("JWT__SECRET", "a-long-enough-signing-secret"),
            ("JWT__ACCESS_TOKEN_HOURS", "1"),
            ("JWT__REFRESH_TOKEN_DAYS", "7"),
        ]))
        .expect("config");

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.jwt.access_token_lifetime(), chrono::Duration::hours(1));
        assert_eq!(config.jwt.refresh_token_lifetime(), chrono::Duration::days(7));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = ServerConfig::from_source(env(&[
            ("DATABASE_URL", "postgres://localhost/listkeeper"),
            ("JWT__ISSUER", "listkeeper"),
            ("JWT__AUDIENCE", "listkeeper-api"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn blank_secret_is_an_error() {
        let result = ServerConfig::from_source(env(&[
            ("DATABASE_URL", "postgres://localhost/listkeeper"),
            ("JWT__ISSUER", "listkeeper"),
            ("JWT__AUDIENCE", "listkeeper-api"),
            ("JWT__SECRET", ""),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn negative_or_huge_lifetimes_are_errors() {
        for (key, value) in [
            ("JWT__ACCESS_TOKEN_HOURS", "-5"),
            ("JWT__REFRESH_TOKEN_DAYS", "9223372036854775807"),
        ] {
            let result = ServerConfig::from_source(env(&[
                ("DATABASE_URL", "postgres://localhost/listkeeper"),
                ("JWT__ISSUER", "listkeeper"),
                ("JWT__AUDIENCE", "listkeeper-api"),
                ("JWT__SECRET", "a-long-enough-signing-secret"),
                (key, value),
            ]));
            let message = result.err().map(|e| e.to_string()).unwrap_or_default();
            assert!(message.contains("must be between"), "{key}: {message}");
        }
    }
}
