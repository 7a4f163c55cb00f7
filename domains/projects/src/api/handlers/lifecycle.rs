//! Lifecycle transition API handlers
//!
//! `POST /api/projects/{project}/{transition}` runs a request through four
//! gates in order: the transition slug must be known (404), the caller must
//! pass the access check (403), the body must name applicants (400), and the
//! lifecycle must accept the transition (409). Only then do the subscribers
//! persist anything.

use atelier_auth::AuthUser;
use atelier_common::{Error, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::ProjectsState;
use crate::domain::access;
use crate::domain::lifecycle::ProjectLifecycle;
use crate::domain::state::{ProjectState, ProjectTransition};
use crate::domain::subscribers::TransitionEvent;

/// Optional body of a transition request
#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    /// Applicants to take on as creatives (Mediate only)
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

impl TransitionRequest {
    fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("Invalid transition request: {}", e)))
    }
}

/// A transition the caller may invoke right now
#[derive(Debug, Serialize)]
pub struct AvailableTransition {
    pub id: &'static str,
    pub slug: &'static str,
    pub label: String,
    pub to: ProjectState,
}

/// Invoke a lifecycle transition; answers with a plain-text confirmation
pub async fn transition(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path((id, slug)): Path<(Uuid, String)>,
    body: Bytes,
) -> Result<&'static str> {
    let transition = ProjectTransition::from_slug(&slug)
        .ok_or_else(|| Error::NotFound(format!("Unknown transition '{}'", slug)))?;

    let mut project = state
        .store
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))?;

    let managers = state.store.organization_managers(project.author_id).await?;
    let decision = access::check_transition(&ctx, &project, &managers, transition);
    if !decision.is_allowed() {
        tracing::warn!(
            project_id = %project.id,
            transition = %transition,
            user_id = %ctx.user_id(),
            "Transition access denied"
        );
    }
    decision.into_result()?;

    if transition == ProjectTransition::Mediate {
        let request = TransitionRequest::from_body(&body)?;
        project.participants = project.select_participants(&request.participants)?;
    }

    let from_state = project.state;
    ProjectLifecycle::new(&mut project, &state.workflow).apply(transition)?;

    let actor_is_manager = managers.contains(&ctx.user_id());
    let mut event =
        TransitionEvent::new(project, transition, from_state, ctx.user_id(), actor_is_manager);
    state
        .dispatcher
        .dispatch(&mut event, state.store.as_ref())
        .await?;

    tracing::info!(
        project_id = %event.project.id,
        transition = %transition,
        from = %from_state,
        to = %event.to_state(),
        user_id = %ctx.user_id(),
        "Project transition completed"
    );
    Ok(transition.confirmation())
}

/// List the transitions the caller could invoke on the project now.
///
/// Mediate is offered when selecting every current applicant would satisfy
/// the participant guard.
pub async fn list_transitions(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AvailableTransition>>> {
    let project = state
        .store
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))?;

    let managers = state.store.organization_managers(project.author_id).await?;
    if !access::check_view(&ctx, &project, &managers).is_allowed() {
        return Err(Error::NotFound("Project not found".to_string()));
    }

    let mut available = Vec::new();
    for transition in ProjectTransition::ALL {
        if !access::check_transition(&ctx, &project, &managers, transition).is_allowed() {
            continue;
        }

        let mut candidate = project.clone();
        if transition == ProjectTransition::Mediate {
            let applicants: Vec<Uuid> = candidate.applicants.iter().map(|a| a.user_id).collect();
            candidate.participants = candidate.select_participants(&applicants)?;
        }
        if !ProjectLifecycle::new(&mut candidate, &state.workflow).can_transition(transition) {
            continue;
        }

        let label = state
            .workflow
            .transition(transition.id())
            .map(|t| t.label.clone())
            .unwrap_or_else(|| transition.slug().to_string());
        available.push(AvailableTransition {
            id: transition.id(),
            slug: transition.slug(),
            label,
            to: transition.successor(),
        });
    }

    Ok(Json(available))
}
