//! Access decisions for project operations
//!
//! Transition requests are decided in a fixed order: the bypass permission
//! wins outright, then the per-transition permission must be held, then the
//! caller must be the right party for that transition. Decisions have no side
//! effects; callers turn `Forbidden` into a 403 before touching the project.

use atelier_auth::{permissions, AuthContext};
use uuid::Uuid;

use crate::domain::entities::{Ownable, Project};
use crate::domain::state::ProjectTransition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    Forbidden(String),
}

impl AccessResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessResult::Allowed)
    }

    pub fn into_result(self) -> atelier_common::Result<()> {
        match self {
            AccessResult::Allowed => Ok(()),
            AccessResult::Forbidden(reason) => Err(atelier_common::Error::Authorization(reason)),
        }
    }
}

/// Who, besides a bypass holder, may invoke a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionParty {
    Author,
    OrganizationManager,
    AuthorOrManager,
}

impl TransitionParty {
    pub fn for_transition(transition: ProjectTransition) -> Self {
        match transition {
            ProjectTransition::Submit => TransitionParty::Author,
            ProjectTransition::Publish
            | ProjectTransition::Mediate
            | ProjectTransition::Complete => TransitionParty::OrganizationManager,
            ProjectTransition::Reset => TransitionParty::AuthorOrManager,
        }
    }

    fn admits(&self, user_id: Uuid, project: &Project, managers: &[Uuid]) -> bool {
        let is_author = project.is_owned_by(user_id);
        let is_manager = managers.contains(&user_id);
        match self {
            TransitionParty::Author => is_author,
            TransitionParty::OrganizationManager => is_manager,
            TransitionParty::AuthorOrManager => is_author || is_manager,
        }
    }
}

/// Decide whether the caller may invoke `transition` on `project`.
///
/// `managers` are the managers of the project's owning organization.
pub fn check_transition(
    ctx: &AuthContext,
    project: &Project,
    managers: &[Uuid],
    transition: ProjectTransition,
) -> AccessResult {
    if ctx.has_permission(permissions::BYPASS_TRANSITION_ACCESS) {
        return AccessResult::Allowed;
    }

    let required = permissions::use_transition(transition.id());
    if !ctx.has_permission(&required) {
        return AccessResult::Forbidden(format!("Missing permission '{}'", required));
    }

    let party = TransitionParty::for_transition(transition);
    if !party.admits(ctx.user_id(), project, managers) {
        let reason = match party {
            TransitionParty::Author => "Only the project author may do this",
            TransitionParty::OrganizationManager => {
                "Only a manager of the owning organization may do this"
            }
            TransitionParty::AuthorOrManager => {
                "Only the project author or an organization manager may do this"
            }
        };
        return AccessResult::Forbidden(reason.to_string());
    }

    AccessResult::Allowed
}

pub fn check_create(ctx: &AuthContext) -> AccessResult {
    if ctx.has_permission(permissions::CREATE_PROJECT) {
        AccessResult::Allowed
    } else {
        AccessResult::Forbidden(format!(
            "Missing permission '{}'",
            permissions::CREATE_PROJECT
        ))
    }
}

/// Applying needs the permission and must not come from the author
pub fn check_apply(ctx: &AuthContext, project: &Project) -> AccessResult {
    if !ctx.has_permission(permissions::APPLY_TO_PROJECT) {
        return AccessResult::Forbidden(format!(
            "Missing permission '{}'",
            permissions::APPLY_TO_PROJECT
        ));
    }
    if project.is_owned_by(ctx.user_id()) {
        return AccessResult::Forbidden("Authors cannot apply to their own project".to_string());
    }
    AccessResult::Allowed
}

/// Published projects are public to authenticated users; the rest are
/// visible to the author, organization managers, participants and holders of
/// `view any project`.
pub fn check_view(ctx: &AuthContext, project: &Project, managers: &[Uuid]) -> AccessResult {
    let user_id = ctx.user_id();
    let visible = project.published
        || project.is_owned_by(user_id)
        || managers.contains(&user_id)
        || project.is_participant(user_id)
        || ctx.has_permission(permissions::VIEW_ANY_PROJECT);

    if visible {
        AccessResult::Allowed
    } else {
        AccessResult::Forbidden("Project is not visible to you".to_string())
    }
}
