//! Role and capability types for list authorization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A role explicitly assigned to a non-owner on a list.
///
/// Persisted by numeric id. Owner is never stored this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListRole {
    /// Read-only access.
    Viewer,
    /// Read and write access to tasks, comments, and tags.
    Editor,
}

impl ListRole {
    /// Returns the persisted role id.
    #[must_use]
    pub fn id(&self) -> i16 {
        match self {
            Self::Viewer => 1,
            Self::Editor => 2,
        }
    }

    /// Maps a persisted role id back to a role.
    #[must_use]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Viewer),
            2 => Some(Self::Editor),
            _ => None,
        }
    }

    /// Parses an assignable role name, case-insensitively.
    ///
    /// "Owner" is not assignable and yields `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match Role::from_name(name) {
            Role::Editor => Some(Self::Editor),
            Role::Viewer => Some(Self::Viewer),
            Role::Owner | Role::None => None,
        }
    }
}

impl From<ListRole> for Role {
    fn from(role: ListRole) -> Self {
        match role {
            ListRole::Viewer => Role::Viewer,
            ListRole::Editor => Role::Editor,
        }
    }
}

/// A user's effective role on a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The list's owner.
    Owner,
    /// Explicit editor assignment.
    Editor,
    /// Explicit viewer assignment.
    Viewer,
    /// No access.
    None,
}

impl Role {
    /// Parses a role name, case-insensitively. Unknown names are `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("owner") {
            Self::Owner
        } else if name.eq_ignore_ascii_case("editor") {
            Self::Editor
        } else if name.eq_ignore_ascii_case("viewer") {
            Self::Viewer
        } else {
            Self::None
        }
    }

    /// Returns the canonical role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Editor => "Editor",
            Self::Viewer => "Viewer",
            Self::None => "None",
        }
    }

    /// Returns true if this role grants the capability.
    #[must_use]
    pub fn permits(&self, capability: Capability) -> bool {
        match self {
            Self::Owner => true,
            Self::Editor => matches!(capability, Capability::Read | Capability::Write),
            Self::Viewer => matches!(capability, Capability::Read),
            Self::None => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operation class checked against a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the list and its tasks, comments, and tags.
    Read,
    /// Create or modify tasks, comments, and tags, and edit list details.
    Write,
    /// Delete the list.
    Delete,
    /// Grant or revoke Editor/Viewer assignments.
    ManageRoles,
}

impl Capability {
    /// Returns the capability name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::ManageRoles => "manage_roles",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Capability; 4] = [
        Capability::Read,
        Capability::Write,
        Capability::Delete,
        Capability::ManageRoles,
    ];

    #[test]
    fn owner_permits_everything() {
        assert!(ALL.iter().all(|c| Role::Owner.permits(*c)));
    }

    #[test]
    fn editor_reads_and_writes_only() {
        assert!(Role::Editor.permits(Capability::Read));
        assert!(Role::Editor.permits(Capability::Write));
        assert!(!Role::Editor.permits(Capability::Delete));
        assert!(!Role::Editor.permits(Capability::ManageRoles));
    }

    #[test]
    fn viewer_reads_only() {
        assert!(Role::Viewer.permits(Capability::Read));
        assert!(!Role::Viewer.permits(Capability::Write));
        assert!(!Role::Viewer.permits(Capability::Delete));
    }

    #[test]
    fn none_permits_nothing() {
        assert!(ALL.iter().all(|c| !Role::None.permits(*c)));
    }

    #[test]
    fn role_names_parse_case_insensitively() {
        assert_eq!(Role::from_name("editor"), Role::Editor);
        assert_eq!(Role::from_name("VIEWER"), Role::Viewer);
        assert_eq!(Role::from_name("Owner"), Role::Owner);
        assert_eq!(Role::from_name("admin"), Role::None);
        assert_eq!(Role::Editor.to_string(), "Editor");
    }

    #[test]
    fn list_role_ids_are_fixed() {
        assert_eq!(ListRole::Viewer.id(), 1);
        assert_eq!(ListRole::Editor.id(), 2);
        assert_eq!(ListRole::from_id(2), Some(ListRole::Editor));
        assert_eq!(ListRole::from_id(3), None);
    }

    #[test]
    fn owner_is_not_assignable() {
        assert_eq!(ListRole::from_name("owner"), None);
        assert_eq!(ListRole::from_name("Editor"), Some(ListRole::Editor));
        assert_eq!(ListRole::from_name("bogus"), None);
    }
}
