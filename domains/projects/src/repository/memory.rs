//! In-memory project store
//!
//! Keeps the same semantics as the PostgreSQL store (compare-and-set state
//! writes, duplicate applicant rejection, ordering) so handler tests exercise
//! real behaviour. `fail_next` injects a storage failure into one operation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use atelier_common::{Error, Pagination, RepositoryError, Result};

use super::{ProjectQuery, ProjectStore};
use crate::domain::entities::{Applicant, LogbookEntry, Participant, Project, ProjectResult};
use crate::domain::state::ProjectState;

#[derive(Default)]
struct Tables {
    projects: HashMap<Uuid, Project>,
    results: Vec<ProjectResult>,
    logbook: Vec<LogbookEntry>,
    managers: HashMap<Uuid, HashSet<Uuid>>,
}

#[derive(Default)]
pub struct InMemoryProjectStore {
    tables: RwLock<Tables>,
    failing_operation: Mutex<Option<&'static str>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `operation` (e.g. `"set_flags"`) fail
    pub async fn fail_next(&self, operation: &'static str) {
        *self.failing_operation.lock().await = Some(operation);
    }

    async fn check_failure(&self, operation: &'static str) -> Result<()> {
        let mut failing = self.failing_operation.lock().await;
        if *failing == Some(operation) {
            *failing = None;
            return Err(Error::Internal(format!(
                "Injected storage failure in {}",
                operation
            )));
        }
        Ok(())
    }
}

fn missing() -> Error {
    RepositoryError::NotFound.into()
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn find(&self, id: Uuid) -> Result<Option<Project>> {
        self.check_failure("find").await?;
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn list(&self, query: ProjectQuery, page: Pagination) -> Result<Vec<Project>> {
        self.check_failure("list").await?;
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| query.matches(p, tables.managers.get(&p.author_id)))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(projects
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn create(&self, project: &Project) -> Result<()> {
        self.check_failure("create").await?;
        let mut tables = self.tables.write().await;
        if tables.projects.contains_key(&project.id) {
            return Err(RepositoryError::AlreadyExists.into());
        }
        tables.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn save_state(
        &self,
        id: Uuid,
        expected: ProjectState,
        new: ProjectState,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.check_failure("save_state").await?;
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or_else(missing)?;
        if project.state != expected {
            return Err(RepositoryError::StaleWrite.into());
        }
        project.state = new;
        project.updated_at = updated_at;
        Ok(())
    }

    async fn set_participants(&self, id: Uuid, participants: &[Participant]) -> Result<()> {
        self.check_failure("set_participants").await?;
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or_else(missing)?;
        project.participants = participants.to_vec();
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn add_applicant(&self, id: Uuid, applicant: &Applicant) -> Result<()> {
        self.check_failure("add_applicant").await?;
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or_else(missing)?;
        if project.is_applicant(applicant.user_id) {
            return Err(RepositoryError::AlreadyExists.into());
        }
        project.applicants.push(applicant.clone());
        project.updated_at = applicant.applied_at;
        Ok(())
    }

    async fn set_flags(&self, id: Uuid, published: bool, promoted: bool) -> Result<()> {
        self.check_failure("set_flags").await?;
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or_else(missing)?;
        project.published = published;
        project.promoted = promoted;
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn create_result(&self, result: &ProjectResult) -> Result<()> {
        self.check_failure("create_result").await?;
        self.tables.write().await.results.push(result.clone());
        Ok(())
    }

    async fn list_results(&self, project_id: Uuid) -> Result<Vec<ProjectResult>> {
        self.check_failure("list_results").await?;
        Ok(self
            .tables
            .read()
            .await
            .results
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn append_logbook(&self, entry: &LogbookEntry) -> Result<()> {
        self.check_failure("append_logbook").await?;
        self.tables.write().await.logbook.push(entry.clone());
        Ok(())
    }

    async fn logbook(&self, project_id: Uuid) -> Result<Vec<LogbookEntry>> {
        self.check_failure("logbook").await?;
        Ok(self
            .tables
            .read()
            .await
            .logbook
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn organization_managers(&self, organization_id: Uuid) -> Result<Vec<Uuid>> {
        self.check_failure("organization_managers").await?;
        let tables = self.tables.read().await;
        let mut managers: Vec<Uuid> = tables
            .managers
            .get(&organization_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        managers.sort();
        Ok(managers)
    }

    async fn add_manager(&self, organization_id: Uuid, manager_id: Uuid) -> Result<()> {
        self.check_failure("add_manager").await?;
        self.tables
            .write()
            .await
            .managers
            .entry(organization_id)
            .or_default()
            .insert(manager_id);
        Ok(())
    }
}
