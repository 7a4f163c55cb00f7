//! Permission names and the role → permission map

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use crate::types::Role;

/// Skips every per-transition and party check on project transitions
pub const BYPASS_TRANSITION_ACCESS: &str = "bypass project_lifecycle transition access";
pub const CREATE_PROJECT: &str = "create project";
pub const APPLY_TO_PROJECT: &str = "apply to project";
/// View unpublished projects regardless of authorship
pub const VIEW_ANY_PROJECT: &str = "view any project";

/// Permission required to invoke one workflow transition, e.g.
/// `use project_lifecycle transition project_submit`
pub fn use_transition(transition_id: &str) -> String {
    format!("use project_lifecycle transition {}", transition_id)
}

/// Role → granted permissions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RolePermissions {
    grants: HashMap<Role, BTreeSet<String>>,
}

impl RolePermissions {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in permission set for the marketplace roles
    pub fn marketplace_defaults() -> Self {
        let mut perms = Self::empty();

        perms.grant(Role::Organization, CREATE_PROJECT);
        perms.grant(Role::Organization, use_transition("project_submit"));
        perms.grant(Role::Organization, use_transition("project_reset"));

        perms.grant(Role::Manager, VIEW_ANY_PROJECT);
        perms.grant(Role::Manager, use_transition("project_publish"));
        perms.grant(Role::Manager, use_transition("project_mediate"));
        perms.grant(Role::Manager, use_transition("project_complete"));
        perms.grant(Role::Manager, use_transition("project_reset"));

        perms.grant(Role::Creative, APPLY_TO_PROJECT);

        perms.grant(Role::Administrator, BYPASS_TRANSITION_ACCESS);
        perms.grant(Role::Administrator, VIEW_ANY_PROJECT);
        perms.grant(Role::Administrator, CREATE_PROJECT);

        perms
    }

    /// Parse a JSON object of role name → permission list
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn grant(&mut self, role: Role, permission: impl Into<String>) -> &mut Self {
        self.grants
            .entry(role)
            .or_default()
            .insert(permission.into());
        self
    }

    pub fn revoke(&mut self, role: Role, permission: &str) -> &mut Self {
        if let Some(set) = self.grants.get_mut(&role) {
            set.remove(permission);
        }
        self
    }

    /// Union of the permissions granted to `roles`
    pub fn resolve(&self, roles: &[Role]) -> BTreeSet<String> {
        roles
            .iter()
            .filter_map(|role| self.grants.get(role))
            .flat_map(|set| set.iter().cloned())
            .collect()
    }
}
