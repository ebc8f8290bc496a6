//! Error types for the auth crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StoreError`: Faults reported by a credential store implementation
//! - `AuthError`: Faults surfaced by token issuance (wraps store faults)
//! - `JwtConfigError`: Unusable token configuration
//!
//! Expected credential failures (unknown user, wrong password, stale or
//! mismatched refresh token) are not errors; they come back as `None`/`false`.

use std::fmt;

/// Errors from credential store operations.
///
/// These represent environment faults, not rejected credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or is in an unusable state.
    Unavailable { details: String },
    /// A stored record could not be decoded.
    Corrupt { details: String },
    /// A write conflicted with existing data (e.g., duplicate username).
    Conflict { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "credential store unavailable: {details}")
            }
            Self::Corrupt { details } => {
                write!(f, "corrupt credential record: {details}")
            }
            Self::Conflict { details } => {
                write!(f, "credential store conflict: {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from token issuance operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A credential store call failed unexpectedly (use as context wrapper).
    Store { operation: &'static str },
    /// Signing the access token failed.
    TokenSigning { reason: String },
    /// Hashing a password failed.
    PasswordHashing { reason: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { operation } => {
                write!(f, "credential store operation '{operation}' failed")
            }
            Self::TokenSigning { reason } => {
                write!(f, "failed to sign access token: {reason}")
            }
            Self::PasswordHashing { reason } => {
                write!(f, "failed to hash password: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Problems found in a [`JwtConfig`](crate::JwtConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtConfigError {
    /// A required value is blank.
    Empty { field: &'static str },
    /// A lifetime is not between 1 and `max`.
    OutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },
}

impl fmt::Display for JwtConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "jwt.{field} must not be empty"),
            Self::OutOfRange { field, value, max } => {
                write!(f, "jwt.{field} must be between 1 and {max}, got {value}")
            }
        }
    }
}

impl std::error::Error for JwtConfigError {}
