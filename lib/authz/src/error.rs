//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug)]
pub enum AuthzError {
    /// The resource does not exist or the caller has no role on it.
    NotFound {
        /// The resource that was accessed.
        resource: String,
    },
    /// Looking up ownership or role assignments failed.
    LookupFailed {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { resource } => {
                write!(f, "resource '{}' not found", resource)
            }
            Self::LookupFailed { details } => {
                write!(f, "role lookup failed: {}", details)
            }
        }
    }
}

impl std::error::Error for AuthzError {}
