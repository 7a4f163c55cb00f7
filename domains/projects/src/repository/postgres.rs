//! PostgreSQL project store
//!
//! Uses runtime `sqlx::query_as` (not the compile-time macros), so building
//! does not need a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use atelier_common::{Pagination, RepositoryError, Result};

use super::{ProjectQuery, ProjectStore};
use crate::domain::entities::{
    Applicant, LogbookEntry, Participant, ParticipantRole, Project, ProjectResult,
};
use crate::domain::state::{ProjectState, ProjectTransition};

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    title: String,
    description: String,
    author_id: Uuid,
    state: String,
    published: bool,
    promoted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ApplicantRow {
    project_id: Uuid,
    user_id: Uuid,
    applied_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    project_id: Uuid,
    user_id: Uuid,
    role: String,
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    id: Uuid,
    project_id: Uuid,
    author_id: Uuid,
    participant_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LogbookRow {
    id: Uuid,
    project_id: Uuid,
    actor_id: Uuid,
    transition: String,
    from_state: String,
    to_state: String,
    created_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(
        self,
        applicants: Vec<Applicant>,
        participants: Vec<Participant>,
    ) -> Result<Project> {
        Ok(Project {
            id: self.id,
            title: self.title,
            description: self.description,
            author_id: self.author_id,
            state: ProjectState::from_id(&self.state)?,
            applicants,
            participants,
            published: self.published,
            promoted: self.promoted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ParticipantRow {
    fn to_participant(&self) -> Result<Participant> {
        let role = ParticipantRole::from_id(&self.role).ok_or_else(|| {
            RepositoryError::InvalidData(format!("Unknown participant role '{}'", self.role))
        })?;
        Ok(Participant {
            user_id: self.user_id,
            role,
        })
    }
}

impl LogbookRow {
    fn into_entry(self) -> Result<LogbookEntry> {
        let transition = ProjectTransition::from_id(&self.transition).ok_or_else(|| {
            RepositoryError::InvalidData(format!("Unknown transition '{}'", self.transition))
        })?;
        Ok(LogbookEntry {
            id: self.id,
            project_id: self.project_id,
            actor_id: self.actor_id,
            transition,
            from_state: ProjectState::from_id(&self.from_state)?,
            to_state: ProjectState::from_id(&self.to_state)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach applicants and participants to a batch of project rows
    async fn hydrate(&self, rows: Vec<ProjectRow>) -> Result<Vec<Project>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let applicants: Vec<ApplicantRow> = sqlx::query_as(
            r#"
            SELECT project_id, user_id, applied_at
            FROM project_applicants
            WHERE project_id = ANY($1)
            ORDER BY applied_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let participants: Vec<ParticipantRow> = sqlx::query_as(
            r#"
            SELECT project_id, user_id, role
            FROM project_participants
            WHERE project_id = ANY($1)
            ORDER BY position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            let project_applicants = applicants
                .iter()
                .filter(|a| a.project_id == row.id)
                .map(|a| Applicant {
                    user_id: a.user_id,
                    applied_at: a.applied_at,
                })
                .collect();
            let project_participants = participants
                .iter()
                .filter(|p| p.project_id == row.id)
                .map(ParticipantRow::to_participant)
                .collect::<Result<Vec<_>>>()?;
            projects.push(row.into_project(project_applicants, project_participants)?);
        }
        Ok(projects)
    }

    async fn project_exists(&self, id: Uuid) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn find(&self, id: Uuid) -> Result<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, author_id, state,
                   published, promoted, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, query: ProjectQuery, page: Pagination) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.title, p.description, p.author_id, p.state,
                   p.published, p.promoted, p.created_at, p.updated_at
            FROM projects p
            WHERE ($1::text IS NULL OR p.state = $1)
              AND ($2::uuid IS NULL
                   OR p.published
                   OR p.author_id = $2
                   OR EXISTS (
                       SELECT 1 FROM organization_managers om
                       WHERE om.organization_id = p.author_id AND om.manager_id = $2
                   )
                   OR EXISTS (
                       SELECT 1 FROM project_participants pp
                       WHERE pp.project_id = p.id AND pp.user_id = $2
                   ))
            ORDER BY p.created_at DESC, p.id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.state.map(|s| s.id()))
        .bind(query.visible_to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn create(&self, project: &Project) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (
                id, title, description, author_id, state,
                published, promoted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.author_id)
        .bind(project.state.id())
        .bind(project.published)
        .bind(project.promoted)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists.into());
        }
        Ok(())
    }

    async fn save_state(
        &self,
        id: Uuid,
        expected: ProjectState,
        new: ProjectState,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET state = $3, updated_at = $4
            WHERE id = $1 AND state = $2
            "#,
        )
        .bind(id)
        .bind(expected.id())
        .bind(new.id())
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let err = if self.project_exists(id).await? {
                RepositoryError::StaleWrite
            } else {
                RepositoryError::NotFound
            };
            return Err(err.into());
        }
        Ok(())
    }

    async fn set_participants(&self, id: Uuid, participants: &[Participant]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM project_participants WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (position, participant) in participants.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO project_participants (project_id, user_id, role, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(participant.user_id)
            .bind(participant.role.id())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        let touched = sqlx::query("UPDATE projects SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(RepositoryError::NotFound.into());
        }

        tx.commit().await?;
        Ok(())
    }

    async fn add_applicant(&self, id: Uuid, applicant: &Applicant) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO project_applicants (project_id, user_id, applied_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(applicant.user_id)
        .bind(applicant.applied_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists.into());
        }
        Ok(())
    }

    async fn set_flags(&self, id: Uuid, published: bool, promoted: bool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET published = $2, promoted = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(published)
        .bind(promoted)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound.into());
        }
        Ok(())
    }

    async fn create_result(&self, result: &ProjectResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_results (id, project_id, author_id, participant_ids, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(result.id)
        .bind(result.project_id)
        .bind(result.author_id)
        .bind(&result.participant_ids)
        .bind(result.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_results(&self, project_id: Uuid) -> Result<Vec<ProjectResult>> {
        let rows: Vec<ResultRow> = sqlx::query_as(
            r#"
            SELECT id, project_id, author_id, participant_ids, created_at
            FROM project_results
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProjectResult {
                id: r.id,
                project_id: r.project_id,
                author_id: r.author_id,
                participant_ids: r.participant_ids,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn append_logbook(&self, entry: &LogbookEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_logbook (
                id, project_id, actor_id, transition, from_state, to_state, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.project_id)
        .bind(entry.actor_id)
        .bind(entry.transition.id())
        .bind(entry.from_state.id())
        .bind(entry.to_state.id())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn logbook(&self, project_id: Uuid) -> Result<Vec<LogbookEntry>> {
        let rows: Vec<LogbookRow> = sqlx::query_as(
            r#"
            SELECT id, project_id, actor_id, transition, from_state, to_state, created_at
            FROM project_logbook
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LogbookRow::into_entry).collect()
    }

    async fn organization_managers(&self, organization_id: Uuid) -> Result<Vec<Uuid>> {
        let managers = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT manager_id
            FROM organization_managers
            WHERE organization_id = $1
            ORDER BY manager_id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(managers)
    }

    async fn add_manager(&self, organization_id: Uuid, manager_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO organization_managers (organization_id, manager_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(organization_id)
        .bind(manager_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
