//! Property tests for the role hierarchy and the policy engine.

use chrono::Utc;
use proptest::prelude::*;
use warrant_types::{UserId, WorkspaceId};

use crate::{Action, Member, Permission, PermissionPolicy, ResourceType, Role};

fn any_role() -> impl Strategy<Value = Role> {
    proptest::sample::select(Role::ALL.to_vec())
}

fn any_non_owner() -> impl Strategy<Value = Role> {
    proptest::sample::select(Role::ALL[1..].to_vec())
}

fn any_resource() -> impl Strategy<Value = ResourceType> {
    proptest::sample::select(ResourceType::ALL.to_vec())
}

fn any_action() -> impl Strategy<Value = Action> {
    proptest::sample::select(Action::ALL.to_vec())
}

fn accepted(role: Role) -> Member {
    let now = Utc::now();
    let mut m = Member::invite(
        WorkspaceId::new("ws1"),
        UserId::new("target"),
        role,
        UserId::new("inviter"),
        now,
    );
    m.accept(now).expect("fresh invitation accepts");
    m
}

proptest! {
    #[test]
    fn role_order_is_reflexive(r in any_role()) {
        prop_assert!(PermissionPolicy::is_role_higher_or_equal(r, r));
    }

    #[test]
    fn role_order_is_antisymmetric(a in any_role(), b in any_role()) {
        if PermissionPolicy::is_role_higher_or_equal(a, b)
            && PermissionPolicy::is_role_higher_or_equal(b, a)
        {
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn role_order_is_transitive(a in any_role(), b in any_role(), c in any_role()) {
        if PermissionPolicy::is_role_higher_or_equal(a, b)
            && PermissionPolicy::is_role_higher_or_equal(b, c)
        {
            prop_assert!(PermissionPolicy::is_role_higher_or_equal(a, c));
        }
    }

    #[test]
    fn role_order_is_total(a in any_role(), b in any_role()) {
        prop_assert!(
            PermissionPolicy::is_role_higher_or_equal(a, b)
                || PermissionPolicy::is_role_higher_or_equal(b, a)
        );
    }

    #[test]
    fn has_permission_is_pure(
        role in any_role(),
        resource in any_resource(),
        action in any_action(),
        noise in proptest::collection::vec((any_role(), any_resource(), any_action()), 0..16),
    ) {
        let policy = PermissionPolicy::standard().without_audit();
        let first = policy.has_permission(role, resource, action);

        for (r, res, act) in noise {
            let _ = policy.has_permission(r, res, act);
        }

        prop_assert_eq!(policy.has_permission(role, resource, action), first);
        prop_assert_eq!(PermissionPolicy::standard().has_permission(role, resource, action), first);
    }

    #[test]
    fn override_is_authoritative_in_both_directions(
        role in any_role(),
        resource in any_resource(),
        action in any_action(),
        allowed in any::<bool>(),
    ) {
        let policy = PermissionPolicy::standard().without_audit();
        let mut member = accepted(role);
        let grant = if allowed {
            Permission::allow(resource, action)
        } else {
            Permission::deny(resource, action)
        };
        member.add_custom_permission(grant, Utc::now()).expect("first override");

        prop_assert_eq!(policy.check_access(&member, resource, action).allowed, allowed);
    }

    #[test]
    fn without_overrides_check_access_matches_matrix(
        role in any_role(),
        resource in any_resource(),
        action in any_action(),
    ) {
        let policy = PermissionPolicy::standard().without_audit();
        let member = accepted(role);
        prop_assert_eq!(
            policy.check_access(&member, resource, action).allowed,
            policy.has_permission(role, resource, action)
        );
    }

    #[test]
    fn change_role_obeys_hierarchy(
        current in any_non_owner(),
        new_role in any_non_owner(),
        acting in any_role(),
    ) {
        let policy = PermissionPolicy::standard().without_audit();
        let mut member = accepted(current);
        let result = policy.change_role(&mut member, new_role, acting, Utc::now());

        let permitted = acting.is_higher_or_equal(current) && acting.is_higher_or_equal(new_role);
        prop_assert_eq!(result.is_ok(), permitted);
        prop_assert_eq!(member.role, if permitted { new_role } else { current });
    }

    #[test]
    fn effective_permissions_are_allowed_and_unique(role in any_role()) {
        let policy = PermissionPolicy::standard().without_audit();
        let member = accepted(role);
        let effective = policy.effective_permissions(&member);

        let mut keys: Vec<_> = effective.iter().map(Permission::key).collect();
        let before = keys.len();
        keys.dedup();
        prop_assert_eq!(keys.len(), before);
        prop_assert!(effective.iter().all(|p| p.allowed));
    }
}
