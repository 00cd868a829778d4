#![allow(clippy::match_same_arms)]
//! Role definitions for RBAC.
//!
//! Defines 7 workspace roles, ordered by a fixed numeric weight:
//! Owner > Admin > Manager > Attorney > Analyst > Viewer > Inventor

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warrant_types::Error;

/// Role of a member within a workspace.
///
/// Comparison uses [`Role::weight`], not declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Exactly one per workspace. Never granted or removed through
    /// ordinary role changes; see ownership transfer.
    Owner,

    /// Full control over the workspace except deleting it.
    Admin,

    /// Manages content, members and sharing.
    ///
    /// Also accepts the legacy name `editor`.
    #[serde(alias = "editor")]
    Manager,

    /// Drafts and edits patents, portfolios and reports.
    Attorney,

    /// Runs analyses and writes reports; read-only on patents.
    Analyst,

    /// Read-only access to workspace content.
    Viewer,

    /// Contributes to their own patents only.
    Inventor,
}

impl Role {
    /// Every role, highest weight first.
    pub const ALL: [Role; 7] = [
        Role::Owner,
        Role::Admin,
        Role::Manager,
        Role::Attorney,
        Role::Analyst,
        Role::Viewer,
        Role::Inventor,
    ];

    /// Returns the hierarchy weight (higher = more privileged).
    ///
    /// Weights are distinct, so the induced order is total and antisymmetric.
    pub const fn weight(self) -> u8 {
        match self {
            Role::Owner => 7,
            Role::Admin => 6,
            Role::Manager => 5,
            Role::Attorney => 4,
            Role::Analyst => 3,
            Role::Viewer => 2,
            Role::Inventor => 1,
        }
    }

    /// Returns whether this role is at or above `other` in the hierarchy.
    ///
    /// # Examples
    ///
    /// ```
    /// use warrant_rbac::roles::Role;
    ///
    /// assert!(Role::Admin.is_higher_or_equal(Role::Viewer));
    /// assert!(Role::Viewer.is_higher_or_equal(Role::Viewer));
    /// assert!(!Role::Viewer.is_higher_or_equal(Role::Admin));
    /// ```
    pub const fn is_higher_or_equal(self, other: Role) -> bool {
        self.weight() >= other.weight()
    }

    /// Roles that bypass a shared resource's own access level.
    pub fn bypasses_resource_level(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Roles that may write to a resource shared with `write` access.
    pub fn is_editor_class(self) -> bool {
        match self {
            Role::Owner | Role::Admin => true,
            Role::Manager | Role::Attorney => true,
            Role::Analyst | Role::Viewer | Role::Inventor => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Attorney => "attorney",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
            Role::Inventor => "inventor",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "manager" | "editor" => Ok(Role::Manager),
            "attorney" => Ok(Role::Attorney),
            "analyst" => Ok(Role::Analyst),
            "viewer" => Ok(Role::Viewer),
            "inventor" => Ok(Role::Inventor),
            _ => Err(Error::validation(format!("unknown role: {s}"))),
        }
    }
}
