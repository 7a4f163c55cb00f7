//! Project lifecycle states and transitions
//!
//! States and transitions are identified by the same string ids the workflow
//! definition uses (`draft`, `project_submit`, ...). The successor of each
//! transition is fixed; the workflow only decides which transitions are
//! legal from which states.

use serde::{Deserialize, Serialize};

use atelier_common::StateError;

/// Lifecycle state of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectState {
    #[default]
    Draft,
    Pending,
    Open,
    Ongoing,
    Completed,
}

impl ProjectState {
    pub const ALL: [ProjectState; 5] = [
        ProjectState::Draft,
        ProjectState::Pending,
        ProjectState::Open,
        ProjectState::Ongoing,
        ProjectState::Completed,
    ];

    /// Workflow state id, also the persisted column value
    pub fn id(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, StateError> {
        Self::ALL
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| StateError::UnknownState(id.to_string()))
    }
}

impl std::fmt::Display for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Named lifecycle operations, serialized by workflow id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectTransition {
    #[serde(rename = "project_submit")]
    Submit,
    #[serde(rename = "project_publish")]
    Publish,
    #[serde(rename = "project_mediate")]
    Mediate,
    #[serde(rename = "project_complete")]
    Complete,
    #[serde(rename = "project_reset")]
    Reset,
}

impl ProjectTransition {
    pub const ALL: [ProjectTransition; 5] = [
        ProjectTransition::Submit,
        ProjectTransition::Publish,
        ProjectTransition::Mediate,
        ProjectTransition::Complete,
        ProjectTransition::Reset,
    ];

    /// Workflow transition id
    pub fn id(&self) -> &'static str {
        match self {
            Self::Submit => "project_submit",
            Self::Publish => "project_publish",
            Self::Mediate => "project_mediate",
            Self::Complete => "project_complete",
            Self::Reset => "project_reset",
        }
    }

    /// URL segment used by `POST /api/projects/{project}/{transition}`
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Publish => "publish",
            Self::Mediate => "mediate",
            Self::Complete => "complete",
            Self::Reset => "reset",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// State a project lands in after this transition
    pub fn successor(&self) -> ProjectState {
        match self {
            Self::Submit => ProjectState::Pending,
            Self::Publish => ProjectState::Open,
            Self::Mediate => ProjectState::Ongoing,
            Self::Complete => ProjectState::Completed,
            Self::Reset => ProjectState::Draft,
        }
    }

    /// Whether the transition needs at least one creative participant
    pub fn requires_participants(&self) -> bool {
        matches!(self, Self::Mediate | Self::Complete)
    }

    /// Past-tense confirmation returned to the caller
    pub fn confirmation(&self) -> &'static str {
        match self {
            Self::Submit => "Project submitted for review.",
            Self::Publish => "Project published.",
            Self::Mediate => "Project mediated; participants confirmed.",
            Self::Complete => "Project completed.",
            Self::Reset => "Project reset to draft.",
        }
    }
}

impl std::fmt::Display for ProjectTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
