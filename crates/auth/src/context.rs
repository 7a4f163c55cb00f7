//! Authorization context for authenticated users

use std::collections::BTreeSet;

use crate::types::{AuthIdentity, Role};

/// Authenticated user plus the permissions resolved from their roles
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthIdentity,
    pub permissions: BTreeSet<String>,
}

impl AuthContext {
    pub fn new(user: AuthIdentity, permissions: BTreeSet<String>) -> Self {
        Self { user, permissions }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user.id
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.user.has_role(role)
    }
}
