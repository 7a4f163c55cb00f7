//! Transition subscribers
//!
//! After the lifecycle accepts a transition, the dispatcher runs every
//! subscriber that handles it, highest priority first. `SaveProjectSubscriber`
//! runs first and writes the new state; the rest persist their own side
//! effects. The chain stops at the first error and nothing already written is
//! undone.

use std::cmp::Reverse;

use async_trait::async_trait;
use uuid::Uuid;

use atelier_common::Result;

use crate::domain::entities::{LogbookEntry, Participant, Project, ProjectResult};
use crate::domain::state::{ProjectState, ProjectTransition};
use crate::repository::ProjectStore;

/// An accepted transition travelling through the subscriber chain
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    /// Project with the transition already applied
    pub project: Project,
    pub transition: ProjectTransition,
    pub from_state: ProjectState,
    pub actor_id: Uuid,
    /// Whether the actor manages the organization owning the project
    pub actor_is_manager: bool,
}

impl TransitionEvent {
    pub fn new(
        project: Project,
        transition: ProjectTransition,
        from_state: ProjectState,
        actor_id: Uuid,
        actor_is_manager: bool,
    ) -> Self {
        Self {
            project,
            transition,
            from_state,
            actor_id,
            actor_is_manager,
        }
    }

    #[mutants::skip] // Reads back the state the lifecycle already set
    pub fn to_state(&self) -> ProjectState {
        self.project.state
    }
}

#[async_trait]
pub trait TransitionSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// Higher runs earlier
    fn priority(&self) -> i32;

    fn handles(&self, transition: ProjectTransition) -> bool;

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()>;
}

/// Ordered subscriber chain
#[derive(Default)]
pub struct TransitionDispatcher {
    subscribers: Vec<Box<dyn TransitionSubscriber>>,
}

impl TransitionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with every built-in subscriber registered
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(SaveProjectSubscriber);
        dispatcher.register(SetParticipantsSubscriber);
        dispatcher.register(AppendManagerSubscriber);
        dispatcher.register(VisibilityFlagsSubscriber);
        dispatcher.register(ProjectResultSubscriber);
        dispatcher.register(LogbookSubscriber);
        dispatcher
    }

    /// Add a subscriber; equal priorities keep registration order
    pub fn register(&mut self, subscriber: impl TransitionSubscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
        self.subscribers.sort_by_key(|s| Reverse(s.priority()));
    }

    pub fn subscriber_names(&self) -> Vec<&'static str> {
        self.subscribers.iter().map(|s| s.name()).collect()
    }

    pub async fn dispatch(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        let transition = event.transition;
        for subscriber in self.subscribers.iter().filter(|s| s.handles(transition)) {
            if let Err(e) = subscriber.on_transition(event, store).await {
                tracing::error!(
                    project_id = %event.project.id,
                    transition = %transition,
                    subscriber = subscriber.name(),
                    error = %e,
                    "Transition subscriber failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Writes the new state, guarded by the state the transition started from
pub struct SaveProjectSubscriber;

#[async_trait]
impl TransitionSubscriber for SaveProjectSubscriber {
    fn name(&self) -> &'static str {
        "save_project"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handles(&self, _transition: ProjectTransition) -> bool {
        true
    }

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        store
            .save_state(
                event.project.id,
                event.from_state,
                event.project.state,
                event.project.updated_at,
            )
            .await?;

        tracing::info!(
            project_id = %event.project.id,
            transition = %event.transition,
            from = %event.from_state,
            to = %event.project.state,
            "Saved project state"
        );
        Ok(())
    }
}

/// Persists the creatives selected for mediation
pub struct SetParticipantsSubscriber;

#[async_trait]
impl TransitionSubscriber for SetParticipantsSubscriber {
    fn name(&self) -> &'static str {
        "set_participants"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn handles(&self, transition: ProjectTransition) -> bool {
        transition == ProjectTransition::Mediate
    }

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        store
            .set_participants(event.project.id, &event.project.participants)
            .await?;

        tracing::info!(
            project_id = %event.project.id,
            transition = %event.transition,
            participants = event.project.participants.len(),
            "Set project participants"
        );
        Ok(())
    }
}

/// Adds the mediating manager to the participant list
pub struct AppendManagerSubscriber;

#[async_trait]
impl TransitionSubscriber for AppendManagerSubscriber {
    fn name(&self) -> &'static str {
        "append_manager"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn handles(&self, transition: ProjectTransition) -> bool {
        transition == ProjectTransition::Mediate
    }

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        if !event.actor_is_manager {
            return Ok(());
        }
        if !event
            .project
            .add_participant(Participant::manager(event.actor_id))
        {
            return Ok(());
        }

        store
            .set_participants(event.project.id, &event.project.participants)
            .await?;

        tracing::info!(
            project_id = %event.project.id,
            transition = %event.transition,
            manager_id = %event.actor_id,
            "Appended manager to project participants"
        );
        Ok(())
    }
}

/// Publish promotes, Complete demotes, Reset hides
pub struct VisibilityFlagsSubscriber;

impl VisibilityFlagsSubscriber {
    /// `(published, promoted)` after the transition, `None` when unchanged
    fn flags_after(transition: ProjectTransition, project: &Project) -> Option<(bool, bool)> {
        match transition {
            ProjectTransition::Publish => Some((true, true)),
            ProjectTransition::Complete => Some((project.published, false)),
            ProjectTransition::Reset => Some((false, false)),
            ProjectTransition::Submit | ProjectTransition::Mediate => None,
        }
    }
}

#[async_trait]
impl TransitionSubscriber for VisibilityFlagsSubscriber {
    fn name(&self) -> &'static str {
        "visibility_flags"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn handles(&self, transition: ProjectTransition) -> bool {
        matches!(
            transition,
            ProjectTransition::Publish | ProjectTransition::Complete | ProjectTransition::Reset
        )
    }

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        let Some((published, promoted)) = Self::flags_after(event.transition, &event.project)
        else {
            return Ok(());
        };

        store
            .set_flags(event.project.id, published, promoted)
            .await?;
        event.project.published = published;
        event.project.promoted = promoted;

        tracing::info!(
            project_id = %event.project.id,
            transition = %event.transition,
            published,
            promoted,
            "Updated project visibility"
        );
        Ok(())
    }
}

/// Records the outcome of a completed project
pub struct ProjectResultSubscriber;

#[async_trait]
impl TransitionSubscriber for ProjectResultSubscriber {
    fn name(&self) -> &'static str {
        "project_result"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn handles(&self, transition: ProjectTransition) -> bool {
        transition == ProjectTransition::Complete
    }

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        let result = ProjectResult::for_project(&event.project);
        store.create_result(&result).await?;

        tracing::info!(
            project_id = %event.project.id,
            transition = %event.transition,
            result_id = %result.id,
            "Created project result"
        );
        Ok(())
    }
}

pub struct LogbookSubscriber;

#[async_trait]
impl TransitionSubscriber for LogbookSubscriber {
    fn name(&self) -> &'static str {
        "logbook"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn handles(&self, _transition: ProjectTransition) -> bool {
        true
    }

    async fn on_transition(
        &self,
        event: &mut TransitionEvent,
        store: &dyn ProjectStore,
    ) -> Result<()> {
        let entry = LogbookEntry::new(
            event.project.id,
            event.actor_id,
            event.transition,
            event.from_state,
            event.to_state(),
        );
        store.append_logbook(&entry).await?;

        tracing::debug!(
            project_id = %event.project.id,
            transition = %event.transition,
            entry_id = %entry.id,
            "Appended logbook entry"
        );
        Ok(())
    }
}
