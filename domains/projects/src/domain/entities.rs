//! Domain entities for the projects domain
//!
//! `Project` is the aggregate; applicants and participants belong to it and
//! are only changed through its methods or the transition subscribers.
//! `ProjectResult` and `LogbookEntry` are child records scoped to a project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_common::{Error, Result};

use crate::domain::state::{ProjectState, ProjectTransition};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Records with a single owning account
pub trait Ownable {
    fn owner_id(&self) -> Uuid;

    fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id() == user_id
    }
}

/// Records tracking creation and last change
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
    fn changed_at(&self) -> DateTime<Utc>;
}

/// Records scoped to a parent project
pub trait HasParent {
    fn parent_id(&self) -> Uuid;
}

/// Role a participant plays in a running project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Creative,
    Manager,
}

impl ParticipantRole {
    pub fn id(&self) -> &'static str {
        match self {
            ParticipantRole::Creative => "creative",
            ParticipantRole::Manager => "manager",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "creative" => Some(ParticipantRole::Creative),
            "manager" => Some(ParticipantRole::Manager),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub user_id: Uuid,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub role: ParticipantRole,
}

impl Participant {
    pub fn creative(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Creative,
        }
    }

    pub fn manager(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Manager,
        }
    }
}

/// Project aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Organization account that owns the project
    pub author_id: Uuid,
    pub state: ProjectState,
    pub applicants: Vec<Applicant>,
    pub participants: Vec<Participant>,
    pub published: bool,
    pub promoted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new draft project with validation
    pub fn new(author_id: Uuid, title: String, description: String) -> Result<Self> {
        validate_title(&title)?;
        validate_description(&description)?;

        let now = Utc::now();
        Ok(Project {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            description,
            author_id,
            state: ProjectState::default(),
            applicants: Vec::new(),
            participants: Vec::new(),
            published: false,
            promoted: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_description(&self.description)
    }

    pub fn is_applicant(&self, user_id: Uuid) -> bool {
        self.applicants.iter().any(|a| a.user_id == user_id)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn creative_participant_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Creative)
            .count()
    }

    /// Register `user_id` as an applicant. Only open projects take applications.
    pub fn apply(&mut self, user_id: Uuid) -> Result<Applicant> {
        if self.state != ProjectState::Open {
            return Err(Error::Conflict(format!(
                "Project is {} and does not accept applications",
                self.state
            )));
        }
        if self.is_applicant(user_id) {
            return Err(Error::Conflict("Already applied to this project".to_string()));
        }

        let applicant = Applicant {
            user_id,
            applied_at: Utc::now(),
        };
        self.applicants.push(applicant.clone());
        self.updated_at = applicant.applied_at;
        Ok(applicant)
    }

    /// Build the creative participant list from selected applicants.
    ///
    /// Duplicates collapse; any id that is not an applicant is rejected.
    pub fn select_participants(&self, selected: &[Uuid]) -> Result<Vec<Participant>> {
        let mut participants: Vec<Participant> = Vec::with_capacity(selected.len());
        for user_id in selected {
            if !self.is_applicant(*user_id) {
                return Err(Error::Validation(format!(
                    "User {} has not applied to this project",
                    user_id
                )));
            }
            if !participants.iter().any(|p| p.user_id == *user_id) {
                participants.push(Participant::creative(*user_id));
            }
        }
        Ok(participants)
    }

    /// Append a participant unless the user already participates
    pub fn add_participant(&mut self, participant: Participant) -> bool {
        if self.is_participant(participant.user_id) {
            return false;
        }
        self.participants.push(participant);
        true
    }
}

impl Ownable for Project {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Timestamped for Project {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn changed_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("Project title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::Validation(format!(
            "Project title must be ≤{} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::Validation(format!(
            "Project description must be ≤{} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

/// Outcome record created when a project completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ProjectResult {
    pub fn for_project(project: &Project) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project.id,
            author_id: project.author_id,
            participant_ids: project.participants.iter().map(|p| p.user_id).collect(),
            created_at: Utc::now(),
        }
    }
}

impl HasParent for ProjectResult {
    fn parent_id(&self) -> Uuid {
        self.project_id
    }
}

impl Timestamped for ProjectResult {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn changed_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One accepted transition in a project's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookEntry {
    pub id: Uuid,
    pub project_id: Uuid,
    pub actor_id: Uuid,
    pub transition: ProjectTransition,
    pub from_state: ProjectState,
    pub to_state: ProjectState,
    pub created_at: DateTime<Utc>,
}

impl LogbookEntry {
    pub fn new(
        project_id: Uuid,
        actor_id: Uuid,
        transition: ProjectTransition,
        from_state: ProjectState,
        to_state: ProjectState,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            actor_id,
            transition,
            from_state,
            to_state,
            created_at: Utc::now(),
        }
    }
}

impl HasParent for LogbookEntry {
    fn parent_id(&self) -> Uuid {
        self.project_id
    }
}

impl Timestamped for LogbookEntry {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn changed_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
