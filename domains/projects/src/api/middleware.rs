//! Projects domain state and auth backend integration

use std::sync::Arc;

use atelier_auth::AuthBackend;
use axum::extract::FromRef;

use crate::domain::subscribers::TransitionDispatcher;
use crate::domain::workflow::Workflow;
use crate::repository::ProjectStore;

/// Application state for the Projects domain
#[derive(Clone)]
pub struct ProjectsState {
    pub store: Arc<dyn ProjectStore>,
    pub workflow: Arc<Workflow>,
    pub dispatcher: Arc<TransitionDispatcher>,
    pub auth: AuthBackend,
}

impl ProjectsState {
    /// State with the built-in transition subscribers
    pub fn new(store: Arc<dyn ProjectStore>, workflow: Workflow, auth: AuthBackend) -> Self {
        Self {
            store,
            workflow: Arc::new(workflow),
            dispatcher: Arc::new(TransitionDispatcher::with_defaults()),
            auth,
        }
    }
}

impl FromRef<ProjectsState> for AuthBackend {
    fn from_ref(state: &ProjectsState) -> Self {
        state.auth.clone()
    }
}
