//! Projects domain: lifecycle state machine, transition subscribers, access checks

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::access::{AccessResult, TransitionParty};
pub use domain::entities::{
    Applicant, LogbookEntry, Participant, ParticipantRole, Project, ProjectResult,
};
pub use domain::lifecycle::{ProjectLifecycle, TransitionError};
pub use domain::state::{ProjectState, ProjectTransition};
pub use domain::subscribers::{TransitionDispatcher, TransitionEvent, TransitionSubscriber};
pub use domain::workflow::{Workflow, WorkflowError};

// Re-export repository types
pub use repository::{InMemoryProjectStore, PgProjectStore, ProjectQuery, ProjectStore};

// Re-export API types
pub use api::routes;
pub use api::ProjectsState;
