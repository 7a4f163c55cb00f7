//! Persistence for the projects domain
//!
//! `ProjectStore` is the seam between handlers/subscribers and storage.
//! `PgProjectStore` is the production implementation; `InMemoryProjectStore`
//! backs tests and the local demo mode.

pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use atelier_common::{Pagination, Result};

use crate::domain::entities::{Applicant, LogbookEntry, Participant, Project, ProjectResult};
use crate::domain::state::ProjectState;

pub use memory::InMemoryProjectStore;
pub use postgres::PgProjectStore;

/// Filter for project listings
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectQuery {
    pub state: Option<ProjectState>,
    /// Restrict to projects this user may see: published, authored,
    /// managed for the author, or participated in. `None` lists everything.
    pub visible_to: Option<Uuid>,
}

impl ProjectQuery {
    /// `author_managers` holds the managers of the project's author
    pub fn matches(&self, project: &Project, author_managers: Option<&HashSet<Uuid>>) -> bool {
        if let Some(state) = self.state {
            if project.state != state {
                return false;
            }
        }
        match self.visible_to {
            Some(user_id) => {
                project.published
                    || project.author_id == user_id
                    || author_managers.is_some_and(|m| m.contains(&user_id))
                    || project.is_participant(user_id)
            }
            None => true,
        }
    }
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Project>>;

    /// Newest first
    async fn list(&self, query: ProjectQuery, page: Pagination) -> Result<Vec<Project>>;

    async fn create(&self, project: &Project) -> Result<()>;

    /// Write `new` only if the stored state is still `expected`.
    ///
    /// A mismatch fails with `Conflict` and writes nothing.
    async fn save_state(
        &self,
        id: Uuid,
        expected: ProjectState,
        new: ProjectState,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Replace the participant list
    async fn set_participants(&self, id: Uuid, participants: &[Participant]) -> Result<()>;

    async fn add_applicant(&self, id: Uuid, applicant: &Applicant) -> Result<()>;

    async fn set_flags(&self, id: Uuid, published: bool, promoted: bool) -> Result<()>;

    async fn create_result(&self, result: &ProjectResult) -> Result<()>;

    async fn list_results(&self, project_id: Uuid) -> Result<Vec<ProjectResult>>;

    async fn append_logbook(&self, entry: &LogbookEntry) -> Result<()>;

    /// Oldest first
    async fn logbook(&self, project_id: Uuid) -> Result<Vec<LogbookEntry>>;

    async fn organization_managers(&self, organization_id: Uuid) -> Result<Vec<Uuid>>;

    async fn add_manager(&self, organization_id: Uuid, manager_id: Uuid) -> Result<()>;
}
