//! Concrete authentication backend
//!
//! Verifies identity tokens and resolves the caller's permissions from the
//! role map. Identity lives with the external provider, so no database
//! lookups happen here.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::permissions::RolePermissions;
use crate::types::{AuthIdentity, Role};

/// Authentication backend shared by every domain state.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    config: AuthConfig,
    permissions: Arc<RolePermissions>,
}

impl AuthBackend {
    pub fn new(config: AuthConfig, permissions: RolePermissions) -> Self {
        Self {
            config,
            permissions: Arc::new(permissions),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn permissions(&self) -> &RolePermissions {
        &self.permissions
    }

    /// Verify a bearer token and build the caller's context
    pub fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;

        let roles = claims.roles.iter().filter_map(|name| {
            let role = Role::parse(name);
            if role.is_none() {
                tracing::warn!(user_id = %user_id, role = %name, "Ignoring unknown role in token");
            }
            role
        });

        let user = AuthIdentity::new(user_id, claims.email.clone(), roles);
        let permissions = self.permissions.resolve(&user.roles);

        tracing::debug!(
            user_id = %user.id,
            roles = ?user.roles,
            permission_count = permissions.len(),
            "Authenticated request"
        );

        Ok(AuthContext::new(user, permissions))
    }
}
