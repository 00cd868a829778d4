//! Authorization decision engine.
//!
//! Evaluation order for [`PermissionPolicy::check_access`] is fixed:
//!
//! 1. inactive member → deny (`inactive`)
//! 2. invitation not accepted → deny (`pending invitation`)
//! 3. custom override for the exact (resource, action) → its `allowed` flag wins
//! 4. role default from the matrix
//! 5. default deny (`insufficient permission`)

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warrant_types::{Error, Result};

use crate::matrix::RolePermissionMatrix;
use crate::member::Member;
use crate::permissions::{Action, Conditions, Permission, PermissionKey, ResourceType};
use crate::roles::Role;

/// Why a decision came out the way it did.
///
/// Deny reasons are generic categories and are safe to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    Inactive,
    PendingInvitation,
    CustomOverride,
    RoleGrant,
    InsufficientPermission,
}

impl DecisionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionReason::Inactive => "inactive",
            DecisionReason::PendingInvitation => "pending invitation",
            DecisionReason::CustomOverride => "custom override",
            DecisionReason::RoleGrant => "role grant",
            DecisionReason::InsufficientPermission => "insufficient permission",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
    /// Conditions attached to the grant that allowed access. The caller
    /// must narrow further when non-empty.
    pub conditions: Conditions,
}

impl Decision {
    fn allow(reason: DecisionReason, conditions: Conditions) -> Self {
        Self {
            allowed: true,
            reason,
            conditions,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
            conditions: Conditions::none(),
        }
    }

    /// Converts a denial into `Forbidden` carrying the generic reason.
    pub fn into_result(self) -> Result<Decision> {
        if self.allowed {
            Ok(self)
        } else {
            Err(Error::forbidden(self.reason.as_str()))
        }
    }
}

/// Policy engine over a shared, immutable role matrix.
///
/// Holds no mutable state. Clone freely across threads.
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    matrix: Arc<RolePermissionMatrix>,
    audit_enabled: bool,
}

impl PermissionPolicy {
    pub fn new(matrix: Arc<RolePermissionMatrix>) -> Self {
        Self {
            matrix,
            audit_enabled: true,
        }
    }

    /// Policy over [`RolePermissionMatrix::standard`].
    pub fn standard() -> Self {
        Self::new(RolePermissionMatrix::standard())
    }

    /// Disables decision logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn matrix(&self) -> &RolePermissionMatrix {
        &self.matrix
    }

    /// Pure matrix lookup. Conditional grants count as granted.
    pub fn has_permission(&self, role: Role, resource: ResourceType, action: Action) -> bool {
        self.matrix
            .lookup(role, resource, action)
            .is_some_and(|p| p.allowed)
    }

    /// Decides whether `member` may perform `action` on `resource`.
    pub fn check_access(&self, member: &Member, resource: ResourceType, action: Action) -> Decision {
        let decision = self.evaluate(member, resource, action);

        if self.audit_enabled {
            if decision.allowed {
                if action.is_high_risk() {
                    info!(
                        user = %member.user_id,
                        workspace = %member.workspace_id,
                        role = %member.role,
                        %resource,
                        %action,
                        "Access granted"
                    );
                } else {
                    debug!(
                        user = %member.user_id,
                        workspace = %member.workspace_id,
                        role = %member.role,
                        %resource,
                        %action,
                        "Access granted"
                    );
                }
            } else {
                warn!(
                    user = %member.user_id,
                    workspace = %member.workspace_id,
                    role = %member.role,
                    %resource,
                    %action,
                    reason = %decision.reason,
                    "Access denied"
                );
            }
        }

        decision
    }

    /// Like [`check_access`](Self::check_access), failing with `Forbidden` on denial.
    pub fn authorize(&self, member: &Member, resource: ResourceType, action: Action) -> Result<Decision> {
        self.check_access(member, resource, action).into_result()
    }

    fn evaluate(&self, member: &Member, resource: ResourceType, action: Action) -> Decision {
        if !member.is_active {
            return Decision::deny(DecisionReason::Inactive);
        }
        if member.is_pending() {
            return Decision::deny(DecisionReason::PendingInvitation);
        }

        if let Some(grant) = member.custom_permission(resource, action) {
            return if grant.allowed {
                Decision::allow(DecisionReason::CustomOverride, grant.conditions.clone())
            } else {
                Decision::deny(DecisionReason::InsufficientPermission)
            };
        }

        match self.matrix.lookup(member.role, resource, action) {
            Some(grant) if grant.allowed => {
                Decision::allow(DecisionReason::RoleGrant, grant.conditions.clone())
            }
            _ => Decision::deny(DecisionReason::InsufficientPermission),
        }
    }

    /// Role defaults merged with overrides (overrides replace same-key
    /// entries), filtered to the allowed set. Sorted by (resource, action).
    ///
    /// Read model for display and audit. Not used on the authorization path.
    pub fn effective_permissions(&self, member: &Member) -> Vec<Permission> {
        let mut merged: BTreeMap<PermissionKey, Permission> = self
            .matrix
            .permissions(member.role)
            .map(|p| (p.key(), p.clone()))
            .collect();

        for p in member.custom_permissions() {
            merged.insert(p.key(), p.clone());
        }

        merged.into_values().filter(|p| p.allowed).collect()
    }

    /// Total-order comparison over role weights. Reflexive.
    pub fn is_role_higher_or_equal(a: Role, b: Role) -> bool {
        a.is_higher_or_equal(b)
    }

    /// Whether `acting` strictly outranks `target`.
    ///
    /// Members can only remove members below them. Nobody outranks the owner.
    pub fn can_manage_role(acting: Role, target: Role) -> bool {
        acting.weight() > target.weight()
    }

    /// Changes `member.role` on behalf of an actor holding `acting_role`.
    ///
    /// The actor must be at or above both the target's current role and the
    /// new role. Ownership is never granted or removed here.
    pub fn change_role(
        &self,
        member: &mut Member,
        new_role: Role,
        acting_role: Role,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if member.role == Role::Owner || new_role == Role::Owner {
            return Err(Error::forbidden("ownership can only change through transfer"));
        }
        if !Self::is_role_higher_or_equal(acting_role, member.role)
            || !Self::is_role_higher_or_equal(acting_role, new_role)
        {
            if self.audit_enabled {
                warn!(
                    user = %member.user_id,
                    workspace = %member.workspace_id,
                    current = %member.role,
                    requested = %new_role,
                    acting = %acting_role,
                    "Role change denied"
                );
            }
            return Err(Error::forbidden("insufficient permission"));
        }

        let previous = member.role;
        member.role = new_role;
        member.updated_at = now;

        if self.audit_enabled {
            info!(
                user = %member.user_id,
                workspace = %member.workspace_id,
                from = %previous,
                to = %new_role,
                acting = %acting_role,
                "Role changed"
            );
        }
        Ok(())
    }
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warrant_types::{UserId, WorkspaceId};

    fn accepted(role: Role) -> Member {
        let now = Utc::now();
        let mut m = Member::invite(
            WorkspaceId::new("ws1"),
            UserId::new("u2"),
            role,
            UserId::new("u1"),
            now,
        );
        m.accept(now).unwrap();
        m
    }

    fn policy() -> PermissionPolicy {
        PermissionPolicy::standard().without_audit()
    }

    #[test]
    fn test_can_manage_role_is_strict() {
        assert!(PermissionPolicy::can_manage_role(Role::Owner, Role::Admin));
        assert!(PermissionPolicy::can_manage_role(Role::Manager, Role::Attorney));
        assert!(!PermissionPolicy::can_manage_role(Role::Manager, Role::Manager));
        assert!(!PermissionPolicy::can_manage_role(Role::Viewer, Role::Analyst));
        assert!(Role::ALL.iter().all(|r| !PermissionPolicy::can_manage_role(*r, Role::Owner)));
    }

    #[test]
    fn test_inactive_checked_before_pending() {
        let mut m = Member::invite(
            WorkspaceId::new("ws1"),
            UserId::new("u2"),
            Role::Admin,
            UserId::new("u1"),
            Utc::now(),
        );
        m.deactivate(Utc::now());

        let d = policy().check_access(&m, ResourceType::Workspace, Action::Read);
        assert!(!d.allowed);
        assert_eq!(d.reason, DecisionReason::Inactive);
    }

    #[test]
    fn test_pending_invitation_denied() {
        let m = Member::invite(
            WorkspaceId::new("ws1"),
            UserId::new("u2"),
            Role::Admin,
            UserId::new("u1"),
            Utc::now(),
        );
        let d = policy().check_access(&m, ResourceType::Workspace, Action::Read);
        assert_eq!(d.reason, DecisionReason::PendingInvitation);
    }

    #[test]
    fn test_override_grants_beyond_role() {
        let mut m = accepted(Role::Viewer);
        m.add_custom_permission(Permission::allow(ResourceType::Report, Action::Export), Utc::now())
            .unwrap();

        let d = policy().check_access(&m, ResourceType::Report, Action::Export);
        assert!(d.allowed);
        assert_eq!(d.reason, DecisionReason::CustomOverride);
    }

    #[test]
    fn test_override_revokes_below_role() {
        let mut m = accepted(Role::Admin);
        m.add_custom_permission(Permission::deny(ResourceType::Patent, Action::Delete), Utc::now())
            .unwrap();

        let d = policy().check_access(&m, ResourceType::Patent, Action::Delete);
        assert!(!d.allowed);
        assert_eq!(d.reason, DecisionReason::InsufficientPermission);

        // Other keys still fall through to the role.
        assert!(policy().check_access(&m, ResourceType::Patent, Action::Update).allowed);
    }

    #[test]
    fn test_role_fallback_and_default_deny() {
        let m = accepted(Role::Viewer);
        let d = policy().check_access(&m, ResourceType::Patent, Action::Read);
        assert_eq!(d.reason, DecisionReason::RoleGrant);

        let d = policy().check_access(&m, ResourceType::Patent, Action::Delete);
        assert!(!d.allowed);
        assert_eq!(d.reason.as_str(), "insufficient permission");
    }

    #[test]
    fn test_conditional_grant_carries_conditions() {
        let m = accepted(Role::Inventor);
        let d = policy().check_access(&m, ResourceType::Patent, Action::Update);
        assert!(d.allowed);
        assert_eq!(d.conditions, Conditions::own_only());
    }

    #[test]
    fn test_authorize_maps_to_forbidden() {
        let m = accepted(Role::Viewer);
        let err = policy()
            .authorize(&m, ResourceType::Workspace, Action::Share)
            .unwrap_err();
        assert_eq!(err, Error::forbidden("insufficient permission"));
    }

    #[test]
    fn test_effective_permissions_override_replaces_then_filters() {
        let mut m = accepted(Role::Viewer);
        let now = Utc::now();
        m.add_custom_permission(Permission::deny(ResourceType::Patent, Action::Read), now)
            .unwrap();
        m.add_custom_permission(Permission::allow(ResourceType::Report, Action::Export), now)
            .unwrap();

        let effective = policy().effective_permissions(&m);
        let keys: Vec<PermissionKey> = effective.iter().map(Permission::key).collect();

        assert!(!keys.contains(&(ResourceType::Patent, Action::Read)));
        assert!(keys.contains(&(ResourceType::Report, Action::Export)));
        assert!(keys.contains(&(ResourceType::Workspace, Action::Read)));
        assert!(effective.iter().all(|p| p.allowed));

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_change_role_within_hierarchy() {
        let mut m = accepted(Role::Viewer);
        policy()
            .change_role(&mut m, Role::Attorney, Role::Manager, Utc::now())
            .unwrap();
        assert_eq!(m.role, Role::Attorney);
    }

    #[test]
    fn test_change_role_cannot_promote_beyond_actor() {
        let mut m = accepted(Role::Viewer);
        let err = policy()
            .change_role(&mut m, Role::Admin, Role::Manager, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        assert_eq!(m.role, Role::Viewer);
    }

    #[test]
    fn test_change_role_cannot_demote_superior() {
        let mut m = accepted(Role::Admin);
        let err = policy()
            .change_role(&mut m, Role::Viewer, Role::Manager, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn test_change_role_never_touches_owner() {
        let mut owner = Member::owner(WorkspaceId::new("ws1"), UserId::new("u1"), Utc::now());
        assert!(policy()
            .change_role(&mut owner, Role::Admin, Role::Owner, Utc::now())
            .is_err());

        let mut m = accepted(Role::Admin);
        assert!(policy()
            .change_role(&mut m, Role::Owner, Role::Owner, Utc::now())
            .is_err());
        assert_eq!(m.role, Role::Admin);
    }
}
