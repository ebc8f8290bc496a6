//! User domain type.
//!
//! A user is identified by an integer id and a unique username, and carries
//! the password hash the credential store verifies logins against.

use chrono::{DateTime, Utc};
use listkeeper_core::UserId;
use serde::{Deserialize, Serialize};

/// A registered user of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Database-assigned user ID.
    id: UserId,
    /// Unique login name.
    username: String,
    /// Argon2 PHC-format password hash. Never serialized.
    #[serde(skip)]
    password_hash: String,
    /// Given name.
    first_name: String,
    /// Family name.
    last_name: String,
    /// When the user registered.
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        username: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            first_name,
            last_name,
            created_at,
        }
    }

    /// Returns the user's ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the stored password hash.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Returns the given name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Returns the family name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Returns when the user registered.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::with_all_fields(
            UserId::new(42),
            "alice".to_string(),
            "$argon2id$v=19$stub".to_string(),
            "Alice".to_string(),
            "Liddell".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn with_all_fields_preserves_values() {
        let user = sample();
        assert_eq!(user.id(), UserId::new(42));
        assert_eq!(user.username(), "alice");
        assert_eq!(user.first_name(), "Alice");
        assert_eq!(user.last_name(), "Liddell");
    }

    #[test]
    fn serialization_omits_password_hash() {
        let json = serde_json::to_string(&sample()).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
