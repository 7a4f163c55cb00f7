//! Identity types derived from verified tokens

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role as granted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Authenticated,
    /// Account that owns and authors projects
    Organization,
    Creative,
    /// Works on behalf of one or more organizations
    Manager,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Authenticated => "authenticated",
            Role::Organization => "organization",
            Role::Creative => "creative",
            Role::Manager => "manager",
            Role::Administrator => "administrator",
        }
    }

    /// Parse a role name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "authenticated" => Some(Role::Authenticated),
            "organization" => Some(Role::Organization),
            "creative" => Some(Role::Creative),
            "manager" => Some(Role::Manager),
            "administrator" => Some(Role::Administrator),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
    /// Always contains `Role::Authenticated`
    pub roles: Vec<Role>,
}

impl AuthIdentity {
    pub fn new(id: Uuid, email: Option<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.push(Role::Authenticated);
        roles.sort();
        roles.dedup();
        Self { id, email, roles }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
