//! Route definitions for Projects domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{lifecycle, organizations, projects};
use super::middleware::ProjectsState;

/// Create project routes
fn project_routes() -> Router<ProjectsState> {
    Router::new()
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/projects/{project}", get(projects::get_project))
        .route("/api/projects/{project}/apply", post(projects::apply))
        .route("/api/projects/{project}/logbook", get(projects::logbook))
        .route("/api/projects/{project}/results", get(projects::results))
}

/// Create lifecycle routes
///
/// The static segments above win over `{transition}`.
fn lifecycle_routes() -> Router<ProjectsState> {
    Router::new()
        .route(
            "/api/projects/{project}/transitions",
            get(lifecycle::list_transitions),
        )
        .route(
            "/api/projects/{project}/{transition}",
            post(lifecycle::transition),
        )
}

/// Create organization routes
fn organization_routes() -> Router<ProjectsState> {
    Router::new().route(
        "/api/organizations/{organization}/managers",
        get(organizations::list_managers).post(organizations::add_manager),
    )
}

/// Create all Projects domain API routes
pub fn routes() -> Router<ProjectsState> {
    Router::new()
        .merge(project_routes())
        .merge(lifecycle_routes())
        .merge(organization_routes())
}
