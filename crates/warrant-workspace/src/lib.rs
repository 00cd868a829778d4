//! warrant-workspace: the workspace aggregate
//!
//! A [`Workspace`] owns its membership set and the set of resources shared
//! with it. Every mutation to either flows through the aggregate, which
//! enforces:
//!
//! - exactly one member holds [`Role::Owner`], and it is `owner_id`
//! - the owner is never removed or re-roled through ordinary mutation
//! - member user IDs are unique
//! - shared resource IDs are unique
//!
//! [`Workspace::has_access`] is a resource-scoped gate layered on top of the
//! role-based [`PermissionPolicy`], not a replacement for it.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use warrant_rbac::{ResourceType, Role};
//! use warrant_types::{ResourceId, UserId, WorkspaceId};
//! use warrant_workspace::{AccessLevel, NewSharedResource, Workspace};
//!
//! let now = Utc::now();
//! let mut ws = Workspace::new(WorkspaceId::new("ws1"), "Filings", UserId::new("u1"), now)?;
//!
//! ws.add_member(UserId::new("u2"), Role::Viewer, UserId::new("u1"), now)?;
//! ws.accept_invitation(&UserId::new("u2"), now)?;
//!
//! ws.share_resource(
//!     NewSharedResource {
//!         resource_id: ResourceId::new("pat-1"),
//!         resource_type: ResourceType::Patent,
//!         shared_by: UserId::new("u1"),
//!         access_level: "write".to_string(),
//!     },
//!     now,
//! )?;
//!
//! assert!(ws.has_access(&UserId::new("u2"), &ResourceId::new("pat-1"), AccessLevel::Read));
//! assert!(!ws.has_access(&UserId::new("u2"), &ResourceId::new("pat-1"), AccessLevel::Write));
//! # Ok::<(), warrant_types::Error>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use warrant_rbac::{Action, Member, PermissionPolicy, ResourceType, Role};
use warrant_types::{Error, ResourceId, Result, UserId, WorkspaceId};

mod shared;


pub use shared::{AccessLevel, NewSharedResource, SharedResource};

/// Lifecycle of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Active,
    Archived,
}

/// Aggregate root for membership and shared resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    owner_id: UserId,
    members: Vec<Member>,
    shared_resources: Vec<SharedResource>,
    status: WorkspaceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Creates a workspace whose owner is already an accepted member.
    pub fn new(
        id: WorkspaceId,
        name: impl Into<String>,
        owner_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::validation("workspace name is required"));
        }
        if id.is_empty() {
            return Err(Error::validation("workspace id is required"));
        }
        if owner_id.is_empty() {
            return Err(Error::validation("owner id is required"));
        }

        let owner = Member::owner(id.clone(), owner_id.clone(), now);
        Ok(Self {
            id,
            name,
            owner_id,
            members: vec![owner],
            shared_resources: Vec::new(),
            status: WorkspaceStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn status(&self) -> WorkspaceStatus {
        self.status
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    pub fn shared_resources(&self) -> &[SharedResource] {
        &self.shared_resources
    }

    pub fn shared_resource(&self, resource_id: &ResourceId) -> Option<&SharedResource> {
        self.shared_resources
            .iter()
            .find(|r| &r.resource_id == resource_id)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Invites `user_id` with `role`. The membership starts pending.
    pub fn add_member(
        &mut self,
        user_id: UserId,
        role: Role,
        invited_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<&Member> {
        self.ensure_active()?;
        if user_id.is_empty() {
            return Err(Error::validation("user id is required"));
        }
        if role == Role::Owner {
            return Err(Error::forbidden("workspace already has an owner"));
        }
        if self.member(&user_id).is_some() {
            return Err(Error::conflict(format!("{user_id} is already a member")));
        }

        info!(workspace = %self.id, user = %user_id, %role, invited_by = %invited_by, "Member invited");

        self.members.push(Member::invite(
            self.id.clone(),
            user_id,
            role,
            invited_by,
            now,
        ));
        self.updated_at = now;
        Ok(&self.members[self.members.len() - 1])
    }

    /// Removes `user_id` from the membership set.
    pub fn remove_member(&mut self, user_id: &UserId, now: DateTime<Utc>) -> Result<Member> {
        self.ensure_active()?;
        if user_id == &self.owner_id {
            return Err(Error::forbidden("owner cannot be removed"));
        }
        let idx = self.member_index(user_id)?;

        info!(workspace = %self.id, user = %user_id, "Member removed");

        self.updated_at = now;
        Ok(self.members.remove(idx))
    }

    /// Removes `user_id` on behalf of `actor`.
    ///
    /// The actor must be an effective member holding `ManageMembers` on the
    /// workspace and must strictly outrank the target. Members may always
    /// leave on their own.
    pub fn remove_member_as(
        &mut self,
        policy: &PermissionPolicy,
        actor: &UserId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Member> {
        self.ensure_active()?;
        if actor != user_id {
            let acting = self
                .member(actor)
                .filter(|m| m.is_effective())
                .ok_or_else(|| Error::forbidden("insufficient permission"))?;
            policy.authorize(acting, ResourceType::Workspace, Action::ManageMembers)?;

            let target = self
                .member(user_id)
                .ok_or_else(|| Error::not_found(format!("member {user_id}")))?;
            if !PermissionPolicy::can_manage_role(acting.role, target.role) {
                return Err(Error::forbidden("insufficient permission"));
            }
        }
        self.remove_member(user_id, now)
    }

    /// Accepts `user_id`'s pending invitation.
    pub fn accept_invitation(&mut self, user_id: &UserId, now: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        let idx = self.member_index(user_id)?;
        self.members[idx].accept(now)?;
        self.updated_at = now;
        Ok(())
    }

    /// Deactivates `user_id`. The record stays in the membership set.
    pub fn deactivate_member(&mut self, user_id: &UserId, now: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        if user_id == &self.owner_id {
            return Err(Error::forbidden("owner cannot be deactivated"));
        }
        let idx = self.member_index(user_id)?;
        self.members[idx].deactivate(now);
        self.updated_at = now;
        Ok(())
    }

    /// Changes `user_id`'s role on behalf of `actor`.
    ///
    /// The actor must be an effective member holding `ManageMembers` on the
    /// workspace. The owner's role is fixed here. Hierarchy rules are
    /// delegated to [`PermissionPolicy::change_role`] using the actor's
    /// current role.
    pub fn change_member_role(
        &mut self,
        policy: &PermissionPolicy,
        actor: &UserId,
        user_id: &UserId,
        new_role: Role,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_active()?;
        if user_id == &self.owner_id {
            return Err(Error::forbidden("owner role cannot be changed"));
        }

        let acting = self
            .member(actor)
            .filter(|m| m.is_effective())
            .ok_or_else(|| Error::forbidden("insufficient permission"))?;
        policy.authorize(acting, ResourceType::Workspace, Action::ManageMembers)?;
        let acting_role = acting.role;

        let idx = self.member_index(user_id)?;
        policy.change_role(&mut self.members[idx], new_role, acting_role, now)?;
        self.updated_at = now;
        Ok(())
    }

    /// Hands ownership to another member with the current owner's consent.
    ///
    /// The previous owner becomes [`Role::Admin`].
    pub fn transfer_ownership(
        &mut self,
        current_owner: &UserId,
        new_owner: &UserId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_active()?;
        if current_owner != &self.owner_id {
            return Err(Error::forbidden("only the owner can transfer ownership"));
        }
        if new_owner == current_owner {
            return Err(Error::validation("new owner is already the owner"));
        }

        let new_idx = self.member_index(new_owner)?;
        if !self.members[new_idx].is_effective() {
            return Err(Error::validation(
                "new owner must be an active, accepted member",
            ));
        }
        let old_idx = self.member_index(current_owner)?;

        self.members[old_idx].role = Role::Admin;
        self.members[old_idx].updated_at = now;
        self.members[new_idx].role = Role::Owner;
        self.members[new_idx].updated_at = now;
        self.owner_id = new_owner.clone();
        self.updated_at = now;

        info!(workspace = %self.id, from = %current_owner, to = %new_owner, "Ownership transferred");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared resources
    // ------------------------------------------------------------------

    /// Shares a resource with the workspace.
    pub fn share_resource(
        &mut self,
        resource: NewSharedResource,
        now: DateTime<Utc>,
    ) -> Result<&SharedResource> {
        self.ensure_active()?;
        let access_level: AccessLevel = resource.access_level.parse()?;
        if resource.resource_id.is_empty() {
            return Err(Error::validation("resource id is required"));
        }
        if self.shared_resource(&resource.resource_id).is_some() {
            return Err(Error::conflict(format!(
                "resource {} is already shared",
                resource.resource_id
            )));
        }

        info!(
            workspace = %self.id,
            resource = %resource.resource_id,
            resource_type = %resource.resource_type,
            %access_level,
            "Resource shared"
        );

        self.shared_resources.push(SharedResource {
            resource_id: resource.resource_id,
            resource_type: resource.resource_type,
            shared_by: resource.shared_by,
            shared_at: now,
            access_level,
        });
        self.updated_at = now;
        Ok(&self.shared_resources[self.shared_resources.len() - 1])
    }

    /// Stops sharing a resource with the workspace.
    pub fn unshare_resource(
        &mut self,
        resource_id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<SharedResource> {
        self.ensure_active()?;
        let idx = self
            .shared_resources
            .iter()
            .position(|r| &r.resource_id == resource_id)
            .ok_or_else(|| Error::not_found(format!("shared resource {resource_id}")))?;

        info!(workspace = %self.id, resource = %resource_id, "Resource unshared");

        self.updated_at = now;
        Ok(self.shared_resources.remove(idx))
    }

    /// Resource-scoped gate.
    ///
    /// - non-members, inactive or pending members, and unshared resources: denied
    /// - Owner/Admin: always allowed
    /// - editor-class roles: `write` only on resources shared with `write`
    /// - every other member: `read` only
    pub fn has_access(
        &self,
        user_id: &UserId,
        resource_id: &ResourceId,
        required: AccessLevel,
    ) -> bool {
        let Some(member) = self.member(user_id).filter(|m| m.is_effective()) else {
            return false;
        };
        let Some(resource) = self.shared_resource(resource_id) else {
            return false;
        };

        if member.role.bypasses_resource_level() {
            return true;
        }

        match required {
            AccessLevel::Read => true,
            AccessLevel::Write => {
                member.role.is_editor_class() && resource.access_level.satisfies(AccessLevel::Write)
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn archive(&mut self, now: DateTime<Utc>) {
        self.status = WorkspaceStatus::Archived;
        self.updated_at = now;
    }

    pub fn restore(&mut self, now: DateTime<Utc>) {
        self.status = WorkspaceStatus::Active;
        self.updated_at = now;
    }

    /// Verifies the aggregate invariants.
    ///
    /// Stores call this before persisting a deserialized or mutated value.
    pub fn check_invariants(&self) -> Result<()> {
        let owners: Vec<&Member> = self
            .members
            .iter()
            .filter(|m| m.role == Role::Owner)
            .collect();
        if owners.len() != 1 || owners[0].user_id != self.owner_id {
            return Err(Error::internal("workspace must have exactly one owner"));
        }

        for (i, m) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|o| o.user_id == m.user_id) {
                return Err(Error::internal(format!("duplicate member {}", m.user_id)));
            }
        }
        for (i, r) in self.shared_resources.iter().enumerate() {
            if self.shared_resources[..i]
                .iter()
                .any(|o| o.resource_id == r.resource_id)
            {
                return Err(Error::internal(format!(
                    "duplicate shared resource {}",
                    r.resource_id
                )));
            }
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        match self.status {
            WorkspaceStatus::Active => Ok(()),
            WorkspaceStatus::Archived => Err(Error::validation("workspace is archived")),
        }
    }

    fn member_index(&self, user_id: &UserId) -> Result<usize> {
        self.members
            .iter()
            .position(|m| &m.user_id == user_id)
            .ok_or_else(|| Error::not_found(format!("member {user_id}")))
    }
}
