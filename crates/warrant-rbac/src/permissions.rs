#![allow(clippy::match_same_arms)]
//! Permission types for access control.
//!
//! A [`Permission`] is an atomic, immutable grant of one [`Action`] on one
//! [`ResourceType`], optionally narrowed by attribute [`Conditions`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Protectable nouns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Workspace,
    Patent,
    Portfolio,
    Report,
    Analysis,
    Settings,
    Member,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Workspace,
        ResourceType::Patent,
        ResourceType::Portfolio,
        ResourceType::Report,
        ResourceType::Analysis,
        ResourceType::Settings,
        ResourceType::Member,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Workspace => "workspace",
            ResourceType::Patent => "patent",
            ResourceType::Portfolio => "portfolio",
            ResourceType::Report => "report",
            ResourceType::Analysis => "analysis",
            ResourceType::Settings => "settings",
            ResourceType::Member => "member",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protectable verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Export,
    Share,
    ManageMembers,
    ManageSettings,
    Analyze,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Export,
        Action::Share,
        Action::ManageMembers,
        Action::ManageSettings,
        Action::Analyze,
    ];

    /// Returns whether this action is high-risk.
    ///
    /// High-risk actions are logged at `info` even when granted.
    pub fn is_high_risk(self) -> bool {
        matches!(
            self,
            Action::Delete | Action::Export | Action::Share | Action::ManageMembers
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Share => "share",
            Action::ManageMembers => "manage_members",
            Action::ManageSettings => "manage_settings",
            Action::Analyze => "analyze",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key under which grants are unique: one entry per (resource, action).
pub type PermissionKey = (ResourceType, Action);

/// Attribute constraints narrowing an otherwise-granted permission.
///
/// Example: `own_only = "true"` restricts the grant to resources the actor
/// owns. An empty map is unconditional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(BTreeMap<String, String>);

impl Conditions {
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `own_only = "true"`.
    pub fn own_only() -> Self {
        Self::none().with("own_only", "true")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every constraint must match the attribute of the same name exactly.
    ///
    /// A missing attribute fails the constraint.
    pub fn is_satisfied_by(&self, attributes: &BTreeMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(k, v)| attributes.get(k).is_some_and(|actual| actual == v))
    }
}

/// A single grant or denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: ResourceType,
    pub action: Action,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
}

impl Permission {
    /// An unconditional grant.
    pub fn allow(resource: ResourceType, action: Action) -> Self {
        Self {
            resource,
            action,
            allowed: true,
            conditions: Conditions::none(),
        }
    }

    /// An explicit denial (used as a custom override below a role default).
    pub fn deny(resource: ResourceType, action: Action) -> Self {
        Self {
            resource,
            action,
            allowed: false,
            conditions: Conditions::none(),
        }
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn key(&self) -> PermissionKey {
        (self.resource, self.action)
    }

    pub fn is_conditional(&self) -> bool {
        !self.conditions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_high_risk() {
        assert!(!Action::Read.is_high_risk());
        assert!(!Action::Update.is_high_risk());
        assert!(Action::Delete.is_high_risk());
        assert!(Action::Export.is_high_risk());
        assert!(Action::Share.is_high_risk());
        assert!(Action::ManageMembers.is_high_risk());
        assert!(!Action::Analyze.is_high_risk());
    }

    #[test]
    fn test_conditions_match_exactly() {
        let conditions = Conditions::own_only();
        let mut attrs = BTreeMap::new();
        assert!(!conditions.is_satisfied_by(&attrs));

        attrs.insert("own_only".to_string(), "false".to_string());
        assert!(!conditions.is_satisfied_by(&attrs));

        attrs.insert("own_only".to_string(), "true".to_string());
        assert!(conditions.is_satisfied_by(&attrs));

        assert!(Conditions::none().is_satisfied_by(&BTreeMap::new()));
    }

    #[test]
    fn test_permission_serde_omits_empty_conditions() {
        let json = serde_json::to_string(&Permission::allow(ResourceType::Patent, Action::Read))
            .unwrap();
        assert_eq!(json, r#"{"resource":"patent","action":"read","allowed":true}"#);

        let conditional = Permission::allow(ResourceType::Patent, Action::Update)
            .with_conditions(Conditions::own_only());
        let json = serde_json::to_string(&conditional).unwrap();
        assert!(json.contains(r#""conditions":{"own_only":"true"}"#));

        let back: Permission = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conditional);
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&Action::ManageMembers).unwrap(),
            "\"manage_members\""
        );
        assert_eq!(Action::ManageSettings.to_string(), "manage_settings");
    }
}
