//! Strongly-typed ID types for domain entities.
//!
//! All IDs wrap the positive integer primary keys assigned by the database.
//! They display as the bare decimal number because that is also the form
//! carried in access-token claims and URL paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed ID wrapper around an `i64` key.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying key.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<i64>().map_err(|e: ParseIntError| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })?;
                if value <= 0 {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: format!("{value} is not a positive key"),
                    });
                }
                Ok(Self(value))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user.
    UserId
);

define_id!(
    /// Unique identifier for a to-do list.
    ListId
);

define_id!(
    /// Unique identifier for a task within a list.
    TaskId
);

define_id!(
    /// Unique identifier for a tag.
    TagId
);

define_id!(
    /// Unique identifier for a comment on a task.
    CommentId
);

define_id!(
    /// Unique identifier for an explicit (non-owner) role assignment on a list.
    RoleAssignmentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_displays_bare_number() {
        let id = UserId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn parse_valid_id() {
        let id: ListId = "17".parse().expect("should parse");
        assert_eq!(id.get(), 17);
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: TaskId = " 9 ".parse().expect("should parse");
        assert_eq!(id, TaskId::new(9));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        let result: Result<UserId, _> = "usr_abc".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "UserId");
    }

    #[test]
    fn parse_rejects_zero_and_negative() {
        assert!("0".parse::<UserId>().is_err());
        assert!("-3".parse::<UserId>().is_err());
    }

    #[test]
    fn id_ordering_follows_key() {
        assert!(TagId::new(1) < TagId::new(2));
    }

    #[test]
    fn id_serializes_as_number() {
        let json = serde_json::to_string(&CommentId::new(5)).expect("serialize");
        assert_eq!(json, "5");
        let parsed: CommentId = serde_json::from_str("5").expect("deserialize");
        assert_eq!(parsed, CommentId::new(5));
    }
}
