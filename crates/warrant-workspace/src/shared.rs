//! Resources shared with a workspace and their access levels.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warrant_rbac::ResourceType;
use warrant_types::{Error, ResourceId, UserId};

/// Access granted to the workspace on a shared resource.
///
/// `Write` implies `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
        }
    }

    /// Returns whether a resource at this level can serve `required`.
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            other => Err(Error::validation(format!(
                "access level must be read or write, got {other:?}"
            ))),
        }
    }
}

/// A resource shared with the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedResource {
    pub resource_id: ResourceId,
    pub resource_type: ResourceType,
    pub shared_by: UserId,
    pub shared_at: DateTime<Utc>,
    pub access_level: AccessLevel,
}

/// Input to [`Workspace::share_resource`](crate::Workspace::share_resource).
///
/// `access_level` is the raw wire value and is validated on use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSharedResource {
    pub resource_id: ResourceId,
    pub resource_type: ResourceType,
    pub shared_by: UserId,
    pub access_level: String,
}
