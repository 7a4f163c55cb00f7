//! Atelier application composition root
//!
//! Loads the workflow and permission map, wires the projects domain to its
//! store and composes the router.

use std::sync::Arc;

use anyhow::Context;
use atelier_auth::{AuthBackend, AuthConfig, RolePermissions};
use atelier_common::Config;
use atelier_projects::{PgProjectStore, ProjectsState, Workflow};
use axum::{routing::get, Router};
use sqlx::PgPool;

/// Create the main application router backed by PostgreSQL
pub async fn create_app(config: &Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let workflow = load_workflow(config)?;
    let auth = AuthBackend::new(auth_config(config), load_permissions(config)?);
    let store = Arc::new(PgProjectStore::new(pool));

    Ok(build_router(ProjectsState::new(store, workflow, auth)))
}

/// Compose domain routers with shared infrastructure routes
pub fn build_router(state: ProjectsState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(|| async { "Atelier API v0.0.1-SNAPSHOT" }))
        .merge(atelier_projects::routes().with_state(state))
}

pub fn auth_config(config: &Config) -> AuthConfig {
    AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    }
}

/// Configured workflow, or the built-in graph
pub fn load_workflow(config: &Config) -> Result<Workflow, anyhow::Error> {
    match &config.workflow_path {
        Some(path) => Workflow::from_file(path)
            .with_context(|| format!("Invalid project workflow at {}", path.display())),
        None => {
            tracing::info!("Using built-in project workflow");
            Ok(Workflow::default_project())
        }
    }
}

/// Configured role map, or the marketplace defaults
pub fn load_permissions(config: &Config) -> Result<RolePermissions, anyhow::Error> {
    match &config.permissions_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let permissions = RolePermissions::from_json(&json)
                .with_context(|| format!("Invalid role permissions in {}", path.display()))?;
            tracing::info!(path = %path.display(), "Loaded role permissions");
            Ok(permissions)
        }
        None => Ok(RolePermissions::marketplace_defaults()),
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
