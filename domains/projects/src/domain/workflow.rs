//! Workflow definition: the configurable graph of legal transitions
//!
//! A workflow lists the lifecycle states and, for each transition, the states
//! it may be taken from and the state it leads to. The lifecycle consults the
//! graph for legality only; successors come from
//! [`ProjectTransition::successor`]. `validate` therefore rejects any graph
//! whose configured target disagrees with that table, so the two can never
//! drift apart at runtime.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::state::{ProjectState, ProjectTransition};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to read workflow file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed workflow definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate {kind} id '{id}' in workflow")]
    Duplicate { kind: &'static str, id: String },

    #[error("Transition '{transition}' references unknown state '{state}'")]
    UnknownState { transition: String, state: String },

    #[error("Workflow is missing lifecycle state '{0}'")]
    MissingState(String),

    #[error("Workflow is missing lifecycle transition '{0}'")]
    MissingTransition(String),

    #[error("Transition '{transition}' targets '{configured}' but the lifecycle moves to '{expected}'")]
    DivergentSuccessor {
        transition: String,
        configured: String,
        expected: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub id: String,
    pub label: String,
    pub from: Vec<String>,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub label: String,
    pub states: Vec<WorkflowState>,
    pub transitions: Vec<WorkflowTransition>,
}

impl Workflow {
    /// Parse and validate a JSON workflow definition
    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        let workflow: Workflow = serde_json::from_str(json)?;
        workflow.validate()?;
        Ok(workflow)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| WorkflowError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let workflow = Self::from_json(&json)?;
        tracing::info!(
            workflow = %workflow.id,
            path = %path.display(),
            transitions = workflow.transitions.len(),
            "Loaded project workflow"
        );
        Ok(workflow)
    }

    /// Built-in linear lifecycle with a reset edge from every state
    pub fn default_project() -> Self {
        fn state(s: ProjectState, label: &str) -> WorkflowState {
            WorkflowState {
                id: s.id().to_string(),
                label: label.to_string(),
            }
        }

        fn transition(t: ProjectTransition, label: &str, from: &[ProjectState]) -> WorkflowTransition {
            WorkflowTransition {
                id: t.id().to_string(),
                label: label.to_string(),
                from: from.iter().map(|s| s.id().to_string()).collect(),
                to: t.successor().id().to_string(),
            }
        }

        Self {
            id: "project_lifecycle".to_string(),
            label: "Project lifecycle".to_string(),
            states: vec![
                state(ProjectState::Draft, "Draft"),
                state(ProjectState::Pending, "Pending"),
                state(ProjectState::Open, "Open"),
                state(ProjectState::Ongoing, "Ongoing"),
                state(ProjectState::Completed, "Completed"),
            ],
            transitions: vec![
                transition(ProjectTransition::Submit, "Submit", &[ProjectState::Draft]),
                transition(
                    ProjectTransition::Publish,
                    "Publish",
                    &[ProjectState::Pending],
                ),
                transition(ProjectTransition::Mediate, "Mediate", &[ProjectState::Open]),
                transition(
                    ProjectTransition::Complete,
                    "Complete",
                    &[ProjectState::Ongoing],
                ),
                transition(ProjectTransition::Reset, "Reset", &ProjectState::ALL),
            ],
        }
    }

    /// Check structural consistency and agreement with the lifecycle
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut state_ids = HashSet::new();
        for state in &self.states {
            if !state_ids.insert(state.id.as_str()) {
                return Err(WorkflowError::Duplicate {
                    kind: "state",
                    id: state.id.clone(),
                });
            }
        }

        let mut transition_ids = HashSet::new();
        for transition in &self.transitions {
            if !transition_ids.insert(transition.id.as_str()) {
                return Err(WorkflowError::Duplicate {
                    kind: "transition",
                    id: transition.id.clone(),
                });
            }
            for state in transition.from.iter().chain(std::iter::once(&transition.to)) {
                if !state_ids.contains(state.as_str()) {
                    return Err(WorkflowError::UnknownState {
                        transition: transition.id.clone(),
                        state: state.clone(),
                    });
                }
            }
        }

        for state in ProjectState::ALL {
            if !state_ids.contains(state.id()) {
                return Err(WorkflowError::MissingState(state.id().to_string()));
            }
        }

        for lifecycle in ProjectTransition::ALL {
            let configured = self
                .transition(lifecycle.id())
                .ok_or_else(|| WorkflowError::MissingTransition(lifecycle.id().to_string()))?;
            let expected = lifecycle.successor().id();
            if configured.to != expected {
                return Err(WorkflowError::DivergentSuccessor {
                    transition: configured.id.clone(),
                    configured: configured.to.clone(),
                    expected: expected.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn state(&self, id: &str) -> Option<&WorkflowState> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn transition(&self, id: &str) -> Option<&WorkflowTransition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    /// Whether the graph has an edge for `transition_id` leaving `from`
    pub fn has_transition(&self, from: &str, transition_id: &str) -> bool {
        self.transition(transition_id)
            .is_some_and(|t| t.from.iter().any(|s| s == from))
    }

    pub fn allows(&self, from: ProjectState, transition: ProjectTransition) -> bool {
        self.has_transition(from.id(), transition.id())
    }

    /// Transitions leaving `state`, in definition order
    pub fn transitions_from(&self, state: &str) -> Vec<&WorkflowTransition> {
        self.transitions
            .iter()
            .filter(|t| t.from.iter().any(|s| s == state))
            .collect()
    }
}
