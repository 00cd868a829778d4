//! The static role → default permissions matrix.
//!
//! Built once at start-up and never mutated. Safe for unsynchronized
//! concurrent reads.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::permissions::{Action, Conditions, Permission, PermissionKey, ResourceType};
use crate::roles::Role;

/// Default grants for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub description: String,
    pub is_system_role: bool,
}

/// Immutable mapping from role to its default grants.
#[derive(Debug, Clone)]
pub struct RolePermissionMatrix {
    roles: HashMap<Role, RolePermissions>,
    index: HashMap<(Role, PermissionKey), Permission>,
}

static STANDARD: LazyLock<Arc<RolePermissionMatrix>> =
    LazyLock::new(|| Arc::new(RolePermissionMatrix::build_standard()));

impl RolePermissionMatrix {
    /// Builds a matrix from explicit role definitions.
    ///
    /// A later grant for the same (role, resource, action) replaces an
    /// earlier one.
    pub fn new(definitions: impl IntoIterator<Item = RolePermissions>) -> Self {
        let mut roles = HashMap::new();
        let mut index = HashMap::new();

        for def in definitions {
            for permission in &def.permissions {
                index.insert((def.role, permission.key()), permission.clone());
            }
            roles.insert(def.role, def);
        }

        Self { roles, index }
    }

    /// The process-wide standard matrix.
    pub fn standard() -> Arc<RolePermissionMatrix> {
        Arc::clone(&STANDARD)
    }

    /// Returns the definition for `role`, if configured.
    pub fn get(&self, role: Role) -> Option<&RolePermissions> {
        self.roles.get(&role)
    }

    /// Returns the default grant for (role, resource, action), if any.
    pub fn lookup(&self, role: Role, resource: ResourceType, action: Action) -> Option<&Permission> {
        self.index.get(&(role, (resource, action)))
    }

    /// Iterates the default grants of `role`.
    pub fn permissions(&self, role: Role) -> impl Iterator<Item = &Permission> {
        self.roles
            .get(&role)
            .into_iter()
            .flat_map(|def| def.permissions.iter())
    }

    fn build_standard() -> Self {
        use Action::{Analyze, Create, Delete, Export, ManageMembers, Read, Share, Update};
        use ResourceType::{Analysis, Member, Patent, Portfolio, Report, Settings, Workspace};

        let content = [Patent, Portfolio, Report];

        let owner = ResourceType::ALL
            .iter()
            .flat_map(|&r| Action::ALL.iter().map(move |&a| Permission::allow(r, a)))
            .collect::<Vec<_>>();

        let admin = owner
            .iter()
            .filter(|p| p.key() != (Workspace, Delete))
            .cloned()
            .collect::<Vec<_>>();

        let mut manager = grants(Workspace, &[Read, Share, ManageMembers]);
        for r in content {
            manager.extend(grants(r, &[Create, Read, Update, Delete, Export, Share, Analyze]));
        }
        manager.extend(grants(Analysis, &[Create, Read, Analyze, Export]));
        manager.extend(grants(Member, &[Create, Read]));
        manager.extend(grants(Settings, &[Read]));

        let mut attorney = grants(Workspace, &[Read]);
        attorney.extend(grants(Patent, &[Create, Read, Update, Export, Analyze]));
        attorney.extend(grants(Portfolio, &[Create, Read, Update, Export, Analyze]));
        attorney.extend(grants(Report, &[Create, Read, Update, Export]));
        attorney.extend(grants(Analysis, &[Create, Read, Analyze]));
        attorney.extend(grants(Member, &[Read]));

        let mut analyst = grants(Workspace, &[Read]);
        analyst.extend(grants(Patent, &[Read, Export, Analyze]));
        analyst.extend(grants(Portfolio, &[Read, Export, Analyze]));
        analyst.extend(grants(Report, &[Create, Read, Update, Export]));
        analyst.extend(grants(Analysis, &[Create, Read, Analyze]));
        analyst.extend(grants(Member, &[Read]));

        let mut viewer = Vec::new();
        for r in [Workspace, Patent, Portfolio, Report, Analysis, Member] {
            viewer.extend(grants(r, &[Read]));
        }

        let mut inventor = grants(Workspace, &[Read]);
        inventor.extend(
            [Create, Read, Update]
                .into_iter()
                .map(|a| Permission::allow(Patent, a).with_conditions(Conditions::own_only())),
        );

        Self::new([
            system(Role::Owner, owner, "Full control, including deleting the workspace"),
            system(Role::Admin, admin, "Full control except deleting the workspace"),
            system(Role::Manager, manager, "Manages content, members and sharing"),
            system(Role::Attorney, attorney, "Drafts and edits patents, portfolios and reports"),
            system(Role::Analyst, analyst, "Runs analyses and writes reports"),
            system(Role::Viewer, viewer, "Read-only access to workspace content"),
            system(Role::Inventor, inventor, "Contributes to their own patents"),
        ])
    }
}

fn grants(resource: ResourceType, actions: &[Action]) -> Vec<Permission> {
    actions
        .iter()
        .map(|&a| Permission::allow(resource, a))
        .collect()
}

fn system(role: Role, permissions: Vec<Permission>, description: &str) -> RolePermissions {
    RolePermissions {
        role,
        permissions,
        description: description.to_string(),
        is_system_role: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_every_role_is_defined() {
        let matrix = RolePermissionMatrix::standard();
        for role in Role::ALL {
            let def = matrix.get(role).expect("role defined");
            assert!(def.is_system_role);
            assert!(!def.permissions.is_empty());
        }
    }

    #[test]
    fn test_owner_holds_every_grant() {
        let matrix = RolePermissionMatrix::standard();
        for r in ResourceType::ALL {
            for a in Action::ALL {
                assert!(matrix.lookup(Role::Owner, r, a).is_some(), "{r}:{a}");
            }
        }
    }

    #[test]
    fn test_admin_cannot_delete_workspace() {
        let matrix = RolePermissionMatrix::standard();
        assert!(matrix
            .lookup(Role::Admin, ResourceType::Workspace, Action::Delete)
            .is_none());
        assert!(matrix
            .lookup(Role::Admin, ResourceType::Workspace, Action::Share)
            .is_some());
    }

    #[test_case(Role::Manager, ResourceType::Workspace, Action::Share, true)]
    #[test_case(Role::Manager, ResourceType::Settings, Action::ManageSettings, false)]
    #[test_case(Role::Attorney, ResourceType::Patent, Action::Update, true)]
    #[test_case(Role::Attorney, ResourceType::Workspace, Action::Share, false)]
    #[test_case(Role::Analyst, ResourceType::Patent, Action::Update, false)]
    #[test_case(Role::Analyst, ResourceType::Analysis, Action::Analyze, true)]
    #[test_case(Role::Viewer, ResourceType::Report, Action::Read, true)]
    #[test_case(Role::Viewer, ResourceType::Report, Action::Export, false)]
    #[test_case(Role::Inventor, ResourceType::Patent, Action::Update, true)]
    #[test_case(Role::Inventor, ResourceType::Report, Action::Read, false)]
    fn test_matrix_spot_checks(role: Role, resource: ResourceType, action: Action, granted: bool) {
        let matrix = RolePermissionMatrix::standard();
        assert_eq!(matrix.lookup(role, resource, action).is_some(), granted);
    }

    #[test]
    fn test_inventor_grants_are_own_only() {
        let matrix = RolePermissionMatrix::standard();
        let grant = matrix
            .lookup(Role::Inventor, ResourceType::Patent, Action::Update)
            .unwrap();
        assert_eq!(grant.conditions.get("own_only"), Some("true"));
    }

    #[test]
    fn test_later_definition_replaces_key() {
        let matrix = RolePermissionMatrix::new([RolePermissions {
            role: Role::Viewer,
            permissions: vec![
                Permission::allow(ResourceType::Patent, Action::Read),
                Permission::deny(ResourceType::Patent, Action::Read),
            ],
            description: "custom".to_string(),
            is_system_role: false,
        }]);

        let p = matrix
            .lookup(Role::Viewer, ResourceType::Patent, Action::Read)
            .unwrap();
        assert!(!p.allowed);
    }
}
