//! # Warrant
//!
//! Authorization core for multi-tenant workspaces.
//!
//! - **Role-based access control** - seven ranked roles, a static permission
//!   matrix and per-member overrides ([`PermissionPolicy`])
//! - **Workspace membership** - invitations, role changes, ownership
//!   transfer and resource sharing ([`Workspace`])
//! - **Capability sharing** - signed, revocable, optionally usage-capped
//!   share links ([`CapabilityTokenService`])
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        AccessCore                         │
//! │  ┌──────────────┐   ┌───────────┐   ┌──────────────────┐ │
//! │  │ WarrantConfig│ → │TokenSigner│ → │CapabilityToken-  │ │
//! │  │ (validated)  │   │ (HMAC)    │   │Service (ports)   │ │
//! │  └──────────────┘   └───────────┘   └────────┬─────────┘ │
//! │                                              ▼           │
//! │                                     PermissionPolicy      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use warrant::{AccessCore, SharingPorts, WarrantConfig};
//!
//! let mut config = WarrantConfig::for_tests("a-secret-for-doc-tests");
//! config.sharing.base_domain = "app.example".to_string();
//!
//! let core = AccessCore::from_config(&config, SharingPorts::in_memory())?;
//! assert_eq!(core.sharing().settings().link_for("T"), "https://app.example/share/T");
//! # Ok::<(), warrant::WarrantError>(())
//! ```

mod access;
mod error;

pub use access::AccessCore;
pub use error::{Result, WarrantError};

// Shared types
pub use warrant_types::{
    CancelHandle, Clock, Error, ErrorKind, ManualClock, MemberId, RequestContext, ResourceId,
    ShareId, SystemClock, UserId, WorkspaceId,
};

// Access control
pub use warrant_rbac::{
    Action, Conditions, Decision, DecisionReason, Member, Permission, PermissionKey,
    PermissionPolicy, ResourceType, Role, RolePermissionMatrix, RolePermissions,
};

// Workspaces
pub use warrant_workspace::{
    AccessLevel, NewSharedResource, SharedResource, Workspace, WorkspaceStatus,
};

// Sharing
pub use warrant_sharing::{
    Cache, CacheError, CapabilityTokenService, IncrementOutcome, InMemoryCache,
    InMemoryMemberStore, InMemoryShareStore, InMemoryWorkspaceStore, ListSharesRequest,
    ListSharesResponse, MemberStore, RevokeShareRequest, RevokeShareResponse, ShareDuration,
    ShareLinkResponse, SharePermission, ShareRecord, ShareRequest, ShareResponse, ShareState,
    ShareStore, ShareSummary, SharingPorts, SharingSettings, TokenClaims, TokenSigner,
    ValidateShareTokenResponse, WorkspaceStore,
};

// Configuration
pub use warrant_config::{ConfigError, ConfigLoader, Environment, SharingConfig, WarrantConfig};
