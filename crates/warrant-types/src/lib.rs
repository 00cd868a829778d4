//! # warrant-types: Core types for `Warrant`
//!
//! This crate contains shared types used across the `Warrant` system:
//! - Entity IDs ([`WorkspaceId`], [`UserId`], [`ResourceId`], [`MemberId`], [`ShareId`])
//! - The error taxonomy ([`Error`], [`ErrorKind`])
//! - Request scoping ([`RequestContext`]: cancellation and deadlines)
//! - Time sources ([`Clock`], [`SystemClock`], [`ManualClock`])

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod clock;
mod context;
mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{CancelHandle, RequestContext};
pub use error::{Error, ErrorKind, Result};

// ============================================================================
// String IDs - caller-supplied identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID without validation.
            ///
            /// Use [`parse`](Self::parse) for untrusted input.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parses an ID from untrusted input, rejecting blank values.
            pub fn parse(id: &str) -> Result<Self> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(Error::Validation(concat!($what, " is required").to_string()));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a workspace (tenant-scoped collaboration space).
    WorkspaceId,
    "workspace id"
);

string_id!(
    /// Identifier of a platform user.
    UserId,
    "user id"
);

string_id!(
    /// Identifier of a protectable resource (patent, portfolio, report, ...).
    ResourceId,
    "resource id"
);

// ============================================================================
// UUID IDs - allocated by this core
// ============================================================================

/// Unique identifier for a membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(Uuid);

impl MemberId {
    /// Allocates a fresh random ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a share (capability token backing record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareId(Uuid);

impl ShareId {
    /// Allocates a fresh random ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for ShareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShareId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::Validation("invalid share id".to_string()))
    }
}
