//! Workspace membership records.
//!
//! ```text
//!   invite ──► Pending ──accept──► Accepted
//!                 │                   │
//!                 └──── deactivate ───┴──► Inactive (terminal for access)
//! ```
//!
//! Custom permission overrides are unique per (resource, action).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warrant_types::{Error, MemberId, Result, UserId, WorkspaceId};

use crate::permissions::{Action, Permission, ResourceType};
use crate::roles::Role;

/// Per-user, per-workspace membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    custom_permissions: Vec<Permission>,
    pub invited_by: UserId,
    pub invited_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Creates a pending invitation.
    pub fn invite(
        workspace_id: WorkspaceId,
        user_id: UserId,
        role: Role,
        invited_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MemberId::generate(),
            workspace_id,
            user_id,
            role,
            custom_permissions: Vec::new(),
            invited_by,
            invited_at: now,
            accepted_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the owner's membership, already accepted.
    pub fn owner(workspace_id: WorkspaceId, user_id: UserId, now: DateTime<Utc>) -> Self {
        let mut member = Self::invite(workspace_id, user_id.clone(), Role::Owner, user_id, now);
        member.accepted_at = Some(now);
        member
    }

    pub fn is_pending(&self) -> bool {
        self.accepted_at.is_none()
    }

    /// Active and accepted: the only state in which the member can act.
    pub fn is_effective(&self) -> bool {
        self.is_active && !self.is_pending()
    }

    /// Accepts a pending invitation.
    ///
    /// Fails with `Conflict` if already accepted and `Forbidden` if the
    /// membership was deactivated.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_active {
            return Err(Error::forbidden("inactive"));
        }
        if self.accepted_at.is_some() {
            return Err(Error::conflict("invitation already accepted"));
        }
        self.accepted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Deactivates the membership. The record persists.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.is_active {
            self.is_active = false;
            self.updated_at = now;
        }
    }

    pub fn custom_permissions(&self) -> &[Permission] {
        &self.custom_permissions
    }

    pub fn custom_permission(&self, resource: ResourceType, action: Action) -> Option<&Permission> {
        self.custom_permissions
            .iter()
            .find(|p| p.resource == resource && p.action == action)
    }

    /// Adds an override. Fails with `Conflict` if the key already exists.
    pub fn add_custom_permission(&mut self, permission: Permission, now: DateTime<Utc>) -> Result<()> {
        if self
            .custom_permission(permission.resource, permission.action)
            .is_some()
        {
            return Err(Error::conflict(format!(
                "custom permission {}:{} already set",
                permission.resource, permission.action
            )));
        }
        self.custom_permissions.push(permission);
        self.updated_at = now;
        Ok(())
    }

    /// Inserts or replaces the override for the permission's key.
    pub fn set_custom_permission(&mut self, permission: Permission, now: DateTime<Utc>) {
        match self
            .custom_permissions
            .iter_mut()
            .find(|p| p.key() == permission.key())
        {
            Some(existing) => *existing = permission,
            None => self.custom_permissions.push(permission),
        }
        self.updated_at = now;
    }

    /// Removes the override for (resource, action).
    pub fn remove_custom_permission(
        &mut self,
        resource: ResourceType,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Permission> {
        let idx = self
            .custom_permissions
            .iter()
            .position(|p| p.resource == resource && p.action == action)
            .ok_or_else(|| Error::not_found(format!("custom permission {resource}:{action}")))?;
        self.updated_at = now;
        Ok(self.custom_permissions.remove(idx))
    }
}
