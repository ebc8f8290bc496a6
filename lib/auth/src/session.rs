//! The authenticated session context.
//!
//! Produced by the token validator from a verified access token and passed
//! explicitly to every authorization-dependent call.

use crate::token::AccessClaims;
use listkeeper_core::{ParseIdError, UserId};
use serde::{Deserialize, Serialize};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    user_id: UserId,
    username: String,
}

impl AuthenticatedSession {
    /// Creates a session context for a known user.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    /// Builds a session from verified access token claims.
    pub fn from_claims(claims: &AccessClaims) -> Result<Self, ParseIdError> {
        Ok(Self::new(claims.user_id()?, claims.name.clone()))
    }

    /// Returns the authenticated user's ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the authenticated user's name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}
