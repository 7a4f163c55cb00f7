//! Common test utilities and fixtures for integration tests
//!
//! Every test builds its own `TestApp` over a fresh in-memory store, so tests
//! share nothing and need no database.

use std::sync::Arc;

use atelier_auth::{issue_token, AuthBackend, AuthConfig, Role, RolePermissions};
use atelier_projects::{
    InMemoryProjectStore, Participant, Project, ProjectState, ProjectStore, ProjectsState,
    Workflow,
};
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only"; // pragma: allowlist secret

/// A caller with a signed token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub jwt: String,
}

pub struct TestApp {
    pub store: Arc<InMemoryProjectStore>,
    pub auth_config: AuthConfig,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_workflow(Workflow::default_project())
    }

    pub fn with_workflow(workflow: Workflow) -> Self {
        Self::build(workflow, RolePermissions::marketplace_defaults())
    }

    pub fn with_permissions(permissions: RolePermissions) -> Self {
        Self::build(Workflow::default_project(), permissions)
    }

    fn build(workflow: Workflow, permissions: RolePermissions) -> Self {
        let store = Arc::new(InMemoryProjectStore::new());
        let auth_config = AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            issuer: None,
            audience: None,
        };
        let state = ProjectsState::new(
            store.clone(),
            workflow,
            AuthBackend::new(auth_config.clone(), permissions),
        );

        Self {
            store,
            auth_config,
            router: atelier_app::build_router(state),
        }
    }

    pub fn user(&self, roles: &[Role]) -> TestUser {
        let id = Uuid::new_v4();
        let jwt = issue_token(
            &self.auth_config,
            id,
            Some("member@atelier.test"),
            roles,
            chrono::Duration::hours(1),
        )
        .unwrap();
        TestUser { id, jwt }
    }

    /// An organization account with one manager
    pub async fn organization_with_manager(&self) -> (TestUser, TestUser) {
        let organization = self.user(&[Role::Organization]);
        let manager = self.user(&[Role::Manager]);
        self.store
            .add_manager(organization.id, manager.id)
            .await
            .unwrap();
        (organization, manager)
    }

    /// Insert a project owned by `author` directly in `state`
    pub async fn seed_project(&self, author: &TestUser, state: ProjectState) -> Project {
        let mut project =
            Project::new(author.id, "Museum audio guide".to_string(), String::new()).unwrap();
        project.state = state;
        self.store.create(&project).await.unwrap();
        project
    }

    /// Open project with `creative` already registered as an applicant
    pub async fn seed_open_with_applicant(&self, author: &TestUser, creative: &TestUser) -> Project {
        let mut project = self.seed_project(author, ProjectState::Open).await;
        let applicant = project.apply(creative.id).unwrap();
        self.store
            .add_applicant(project.id, &applicant)
            .await
            .unwrap();
        project
    }

    /// Ongoing project with `creative` as its only participant
    pub async fn seed_ongoing(&self, author: &TestUser, creative: &TestUser) -> Project {
        let project = self.seed_project(author, ProjectState::Ongoing).await;
        self.store
            .set_participants(project.id, &[Participant::creative(creative.id)])
            .await
            .unwrap();
        project
    }

    pub async fn stored(&self, id: Uuid) -> Project {
        self.store.find(id).await.unwrap().unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request(method, uri, user, body))
            .await
            .unwrap()
    }
}

/// Helper: build a request, authenticated when `user` is given
pub fn request(
    method: Method,
    uri: &str,
    user: Option<&TestUser>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer {}", user.jwt));
    }

    if let Some(b) = body {
        builder = builder.header("content-type", "application/json");
        builder
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

/// Helper: parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
