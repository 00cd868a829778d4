//! # warrant-rbac: Role-Based Access Control
//!
//! Decides, for a workspace member, whether an action on a resource type is
//! permitted:
//! - **Role hierarchy** (7 roles, total order by weight)
//! - **Role permission matrix** (static default grants, built once)
//! - **Custom overrides** per member (grant beyond or revoke below the role)
//! - **Conditions** (ABAC-style constraints such as `own_only`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  check_access(member, resource, action)      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  PermissionPolicy                            │
//! │  ├─ Member lifecycle (active, accepted)      │
//! │  ├─ Custom override (exact key, wins)        │
//! │  └─ RolePermissionMatrix (role default)      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - allowed                                   │
//! │  - generic reason                            │
//! │  - conditions to narrow by                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Roles
//!
//! | Role     | Weight | Share workspace | Manage members | Edit patents | Delete workspace |
//! |----------|--------|-----------------|----------------|--------------|------------------|
//! | Owner    | 7      | ✓               | ✓              | ✓            | ✓                |
//! | Admin    | 6      | ✓               | ✓              | ✓            | ✗                |
//! | Manager  | 5      | ✓               | ✓              | ✓            | ✗                |
//! | Attorney | 4      | ✗               | ✗              | ✓            | ✗                |
//! | Analyst  | 3      | ✗               | ✗              | ✗            | ✗                |
//! | Viewer   | 2      | ✗               | ✗              | ✗            | ✗                |
//! | Inventor | 1      | ✗               | ✗              | own only     | ✗                |
//!
//! ## Examples
//!
//! ```
//! use chrono::Utc;
//! use warrant_rbac::{Action, Member, PermissionPolicy, ResourceType, Role};
//! use warrant_types::{UserId, WorkspaceId};
//!
//! let policy = PermissionPolicy::standard();
//! let now = Utc::now();
//!
//! let mut member = Member::invite(
//!     WorkspaceId::new("ws1"),
//!     UserId::new("u2"),
//!     Role::Attorney,
//!     UserId::new("u1"),
//!     now,
//! );
//!
//! // Pending invitations are denied.
//! assert!(!policy.check_access(&member, ResourceType::Patent, Action::Update).allowed);
//!
//! member.accept(now)?;
//! assert!(policy.check_access(&member, ResourceType::Patent, Action::Update).allowed);
//! assert!(!policy.check_access(&member, ResourceType::Workspace, Action::Share).allowed);
//! # Ok::<(), warrant_types::Error>(())
//! ```

pub mod matrix;
pub mod member;
pub mod permissions;
pub mod policy;
pub mod roles;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use matrix::{RolePermissionMatrix, RolePermissions};
pub use member::Member;
pub use permissions::{Action, Conditions, Permission, PermissionKey, ResourceType};
pub use policy::{Decision, DecisionReason, PermissionPolicy};
pub use roles::Role;
