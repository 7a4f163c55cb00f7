//! Project lifecycle state machine
//!
//! A transition is legal when the workflow has an edge for it from the
//! project's current state and, for Mediate and Complete, the project has at
//! least one creative participant. A legal transition moves the project to
//! the fixed successor of that transition. Nothing is persisted here.

use chrono::Utc;
use thiserror::Error;

use crate::domain::entities::Project;
use crate::domain::state::{ProjectState, ProjectTransition};
use crate::domain::workflow::Workflow;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Transition '{transition}' is not allowed from state '{state}'")]
    NotAllowed {
        transition: ProjectTransition,
        state: ProjectState,
    },

    #[error("Transition '{transition}' requires at least one creative participant")]
    MissingParticipants { transition: ProjectTransition },
}

impl From<TransitionError> for atelier_common::Error {
    fn from(err: TransitionError) -> Self {
        atelier_common::Error::Conflict(err.to_string())
    }
}

/// Lifecycle view over one project aggregate
pub struct ProjectLifecycle<'a> {
    project: &'a mut Project,
    workflow: &'a Workflow,
}

impl<'a> ProjectLifecycle<'a> {
    pub fn new(project: &'a mut Project, workflow: &'a Workflow) -> Self {
        Self { project, workflow }
    }

    pub fn state(&self) -> ProjectState {
        self.project.state
    }

    pub fn is_draft(&self) -> bool {
        self.project.state == ProjectState::Draft
    }

    pub fn is_pending(&self) -> bool {
        self.project.state == ProjectState::Pending
    }

    pub fn is_open(&self) -> bool {
        self.project.state == ProjectState::Open
    }

    pub fn is_ongoing(&self) -> bool {
        self.project.state == ProjectState::Ongoing
    }

    pub fn is_completed(&self) -> bool {
        self.project.state == ProjectState::Completed
    }

    /// Successor state if `transition` is legal right now
    pub fn check(&self, transition: ProjectTransition) -> Result<ProjectState, TransitionError> {
        let state = self.project.state;
        if !self.workflow.allows(state, transition) {
            return Err(TransitionError::NotAllowed { transition, state });
        }
        if transition.requires_participants() && self.project.creative_participant_count() == 0 {
            return Err(TransitionError::MissingParticipants { transition });
        }
        Ok(transition.successor())
    }

    pub fn can_transition(&self, transition: ProjectTransition) -> bool {
        self.check(transition).is_ok()
    }

    /// Apply `transition`, leaving the project untouched on error
    pub fn apply(&mut self, transition: ProjectTransition) -> Result<bool, TransitionError> {
        let from = self.project.state;
        let to = self.check(transition)?;

        self.project.state = to;
        self.project.updated_at = Utc::now();

        tracing::debug!(
            project_id = %self.project.id,
            transition = %transition,
            from = %from,
            to = %to,
            "Applied lifecycle transition"
        );
        Ok(true)
    }

    pub fn submit(&mut self) -> Result<bool, TransitionError> {
        self.apply(ProjectTransition::Submit)
    }

    pub fn publish(&mut self) -> Result<bool, TransitionError> {
        self.apply(ProjectTransition::Publish)
    }

    pub fn mediate(&mut self) -> Result<bool, TransitionError> {
        self.apply(ProjectTransition::Mediate)
    }

    pub fn complete(&mut self) -> Result<bool, TransitionError> {
        self.apply(ProjectTransition::Complete)
    }

    pub fn reset(&mut self) -> Result<bool, TransitionError> {
        self.apply(ProjectTransition::Reset)
    }
}
