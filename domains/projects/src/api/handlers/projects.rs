//! Project management API handlers

use atelier_auth::{permissions, AuthContext, AuthUser};
use atelier_common::{Error, Pagination, QueryParams, Result, ValidatedJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ProjectsState;
use crate::domain::access;
use crate::domain::entities::{
    Applicant, LogbookEntry, Participant, Project, ProjectResult,
};
use crate::domain::state::ProjectState;
use crate::repository::ProjectQuery;

/// Request for creating a project
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 10000))]
    pub description: String,
}

/// Query params for listing projects
#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub state: Option<ProjectState>,
}

/// Project response DTO
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author_id: Uuid,
    pub state: ProjectState,
    pub applicants: Vec<Applicant>,
    pub participants: Vec<Participant>,
    pub published: bool,
    pub promoted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            author_id: p.author_id,
            state: p.state,
            applicants: p.applicants,
            participants: p.participants,
            published: p.published,
            promoted: p.promoted,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn project_not_found() -> Error {
    Error::NotFound("Project not found".to_string())
}

/// Load a project the caller may see.
///
/// Hidden projects answer 404 like missing ones.
async fn find_visible(state: &ProjectsState, ctx: &AuthContext, id: Uuid) -> Result<Project> {
    let project = state
        .store
        .find(id)
        .await?
        .ok_or_else(project_not_found)?;

    let managers = state.store.organization_managers(project.author_id).await?;
    if !access::check_view(ctx, &project, &managers).is_allowed() {
        return Err(project_not_found());
    }
    Ok(project)
}

/// Create a new project in Draft
pub async fn create_project(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    access::check_create(&ctx).into_result()?;

    let project = Project::new(ctx.user_id(), req.title, req.description)?;
    state.store.create(&project).await?;

    tracing::info!(
        project_id = %project.id,
        author_id = %project.author_id,
        "Created project"
    );
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// List projects visible to the caller, newest first
pub async fn list_projects(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    QueryParams(query): QueryParams<ListProjectsQuery>,
    QueryParams(page): QueryParams<Pagination>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let visible_to = if ctx.has_permission(permissions::VIEW_ANY_PROJECT) {
        None
    } else {
        Some(ctx.user_id())
    };

    let projects = state
        .store
        .list(
            ProjectQuery {
                state: query.state,
                visible_to,
            },
            page,
        )
        .await?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Get a single project by ID
pub async fn get_project(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>> {
    let project = find_visible(&state, &ctx, id).await?;
    Ok(Json(project.into()))
}

/// Apply to an open project
pub async fn apply(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Applicant>)> {
    let mut project = state
        .store
        .find(id)
        .await?
        .ok_or_else(project_not_found)?;

    access::check_apply(&ctx, &project).into_result()?;

    let applicant = project.apply(ctx.user_id())?;
    state.store.add_applicant(project.id, &applicant).await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %applicant.user_id,
        "Registered project applicant"
    );
    Ok((StatusCode::CREATED, Json(applicant)))
}

/// Transition history, oldest first
pub async fn logbook(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LogbookEntry>>> {
    let project = find_visible(&state, &ctx, id).await?;
    let entries = state.store.logbook(project.id).await?;
    Ok(Json(entries))
}

/// Results recorded each time the project completed
pub async fn results(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectResult>>> {
    let project = find_visible(&state, &ctx, id).await?;
    let results = state.store.list_results(project.id).await?;
    Ok(Json(results))
}
