//! Authentication and permissions for the Atelier API
//!
//! Provides JWT validation, the role → permission map, and axum extractors
//! that work with any domain state implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
pub mod permissions;
mod types;

pub use backend::AuthBackend;
pub use claims::Claims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
pub use jwt::issue_token;
pub use permissions::RolePermissions;
pub use types::{AuthIdentity, Role};
