//! Lifecycle transition endpoint tests

use atelier_auth::Role;
use atelier_projects::{Participant, ProjectState, ProjectStore, ProjectTransition};
use axum::http::{header::CONTENT_TYPE, Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::common::{body_text, parse_body, TestApp};

fn transition_uri(project_id: Uuid, slug: &str) -> String {
    format!("/api/projects/{}/{}", project_id, slug)
}

mod test_transition_gates {
    use super::*;

    #[tokio::test]
    async fn test_author_submits_draft() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "submit"), Some(&author), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(
            body_text(resp).await,
            ProjectTransition::Submit.confirmation()
        );

        assert_eq!(app.stored(project.id).await.state, ProjectState::Pending);
        let logbook = app.store.logbook(project.id).await.unwrap();
        assert_eq!(logbook.len(), 1);
        assert_eq!(logbook[0].actor_id, author.id);
    }

    #[tokio::test]
    async fn test_submit_without_permission_is_forbidden_and_unchanged() {
        let app = TestApp::new();
        // The author's token carries no role granting submit
        let author = app.user(&[]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "submit"), Some(&author), None)
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "ACCESS_DENIED");

        let stored = app.stored(project.id).await;
        assert_eq!(stored, project);
        assert!(app.store.logbook(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_organization_cannot_submit() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let other = app.user(&[Role::Organization]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "submit"), Some(&other), None)
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.stored(project.id).await.state, ProjectState::Draft);
    }

    #[tokio::test]
    async fn test_manager_of_other_organization_cannot_publish() {
        let app = TestApp::new();
        let (author, _) = app.organization_with_manager().await;
        let (_, foreign_manager) = app.organization_with_manager().await;
        let project = app.seed_project(&author, ProjectState::Pending).await;

        let resp = app
            .send(
                Method::POST,
                &transition_uri(project.id, "publish"),
                Some(&foreign_manager),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.stored(project.id).await.state, ProjectState::Pending);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_conflict() {
        let app = TestApp::new();
        let (author, manager) = app.organization_with_manager().await;
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "publish"), Some(&manager), None)
            .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(app.stored(project.id).await.state, ProjectState::Draft);
    }

    #[tokio::test]
    async fn test_mediate_without_participants_is_conflict() {
        let app = TestApp::new();
        let (author, manager) = app.organization_with_manager().await;
        let project = app.seed_project(&author, ProjectState::Open).await;

        let resp = app
            .send(
                Method::POST,
                &transition_uri(project.id, "mediate"),
                Some(&manager),
                Some(json!({"participants": []})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let stored = app.stored(project.id).await;
        assert_eq!(stored.state, ProjectState::Open);
        assert!(stored.participants.is_empty());
    }

    #[tokio::test]
    async fn test_mediate_with_non_applicant_is_bad_request() {
        let app = TestApp::new();
        let (author, manager) = app.organization_with_manager().await;
        let creative = app.user(&[Role::Creative]);
        let project = app.seed_open_with_applicant(&author, &creative).await;

        let resp = app
            .send(
                Method::POST,
                &transition_uri(project.id, "mediate"),
                Some(&manager),
                Some(json!({"participants": [Uuid::new_v4()]})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.stored(project.id).await.state, ProjectState::Open);
    }

    #[tokio::test]
    async fn test_denied_access_wins_over_illegal_transition() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let creative = app.user(&[Role::Creative]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "complete"), Some(&creative), None)
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_transition_is_not_found() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "archive"), Some(&author), None)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);

        let resp = app
            .send(Method::POST, &transition_uri(Uuid::new_v4(), "submit"), Some(&author), None)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "submit"), None, None)
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.stored(project.id).await.state, ProjectState::Draft);
    }

    #[tokio::test]
    async fn test_administrator_bypasses_party_check() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let admin = app.user(&[Role::Administrator]);
        let project = app.seed_project(&author, ProjectState::Pending).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "publish"), Some(&admin), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = app.stored(project.id).await;
        assert_eq!(stored.state, ProjectState::Open);
        assert!(stored.published);
    }

    #[tokio::test]
    async fn test_manager_resets_completed_project() {
        let app = TestApp::new();
        let (author, manager) = app.organization_with_manager().await;
        let creative = app.user(&[Role::Creative]);
        let project = app.seed_ongoing(&author, &creative).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "complete"), Some(&manager), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "reset"), Some(&manager), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_text(resp).await,
            ProjectTransition::Reset.confirmation()
        );
        assert_eq!(app.stored(project.id).await.state, ProjectState::Draft);
    }
}

mod test_full_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_project_runs_from_creation_to_reset() {
        let app = TestApp::new();
        let organization = app.user(&[Role::Organization]);
        let manager = app.user(&[Role::Manager]);
        let creative = app.user(&[Role::Creative]);

        // Organization creates the project and names its manager
        let resp = app
            .send(
                Method::POST,
                "/api/projects",
                Some(&organization),
                Some(json!({"title": "Opera poster series", "description": "Three posters"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = parse_body(resp).await;
        assert_eq!(created["state"], "draft");
        let project_id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

        let resp = app
            .send(
                Method::POST,
                &format!("/api/organizations/{}/managers", organization.id),
                Some(&organization),
                Some(json!({"manager_id": manager.id})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        for (user, slug) in [(&organization, "submit"), (&manager, "publish")] {
            let resp = app
                .send(Method::POST, &transition_uri(project_id, slug), Some(user), None)
                .await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", slug);
        }
        let open = app.stored(project_id).await;
        assert_eq!(open.state, ProjectState::Open);
        assert!(open.published && open.promoted);

        let resp = app
            .send(
                Method::POST,
                &format!("/api/projects/{}/apply", project_id),
                Some(&creative),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .send(
                Method::POST,
                &transition_uri(project_id, "mediate"),
                Some(&manager),
                Some(json!({"participants": [creative.id]})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ongoing = app.stored(project_id).await;
        assert_eq!(ongoing.state, ProjectState::Ongoing);
        assert_eq!(
            ongoing.participants,
            vec![
                Participant::creative(creative.id),
                Participant::manager(manager.id)
            ]
        );

        let resp = app
            .send(Method::POST, &transition_uri(project_id, "complete"), Some(&manager), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let completed = app.stored(project_id).await;
        assert_eq!(completed.state, ProjectState::Completed);
        assert!(completed.published);
        assert!(!completed.promoted);

        let resp = app
            .send(
                Method::GET,
                &format!("/api/projects/{}/results", project_id),
                Some(&creative),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let results = parse_body(resp).await;
        assert_eq!(results.as_array().unwrap().len(), 1);

        let resp = app
            .send(Method::POST, &transition_uri(project_id, "reset"), Some(&organization), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let reset = app.stored(project_id).await;
        assert_eq!(reset.state, ProjectState::Draft);
        assert!(!reset.published && !reset.promoted);

        let resp = app
            .send(
                Method::GET,
                &format!("/api/projects/{}/logbook", project_id),
                Some(&organization),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let logbook = parse_body(resp).await;
        let transitions: Vec<&str> = logbook
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["transition"].as_str().unwrap())
            .collect();
        assert_eq!(
            transitions,
            vec![
                "project_submit",
                "project_publish",
                "project_mediate",
                "project_complete",
                "project_reset"
            ]
        );
    }
}

mod test_list_transitions {
    use super::*;

    async fn slugs(app: &TestApp, project_id: Uuid, user: &crate::common::TestUser) -> Vec<String> {
        let resp = app
            .send(
                Method::GET,
                &format!("/api/projects/{}/transitions", project_id),
                Some(user),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        parse_body(resp)
            .await
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["slug"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_author_sees_submit_and_reset_on_draft() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        assert_eq!(slugs(&app, project.id, &author).await, vec!["submit", "reset"]);
    }

    #[tokio::test]
    async fn test_mediate_offered_only_with_applicants() {
        let app = TestApp::new();
        let (author, manager) = app.organization_with_manager().await;
        let creative = app.user(&[Role::Creative]);

        let empty = app.seed_project(&author, ProjectState::Open).await;
        assert_eq!(slugs(&app, empty.id, &manager).await, vec!["reset"]);

        let with_applicant = app.seed_open_with_applicant(&author, &creative).await;
        assert_eq!(
            slugs(&app, with_applicant.id, &manager).await,
            vec!["mediate", "reset"]
        );
    }

    #[tokio::test]
    async fn test_hidden_project_is_not_found() {
        let app = TestApp::new();
        let author = app.user(&[Role::Organization]);
        let creative = app.user(&[Role::Creative]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(
                Method::GET,
                &format!("/api/projects/{}/transitions", project.id),
                Some(&creative),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

mod test_custom_workflow {
    use super::*;
    use atelier_projects::Workflow;

    #[tokio::test]
    async fn test_narrowed_reset_edge_is_enforced() {
        let mut workflow = Workflow::default_project();
        for t in workflow.transitions.iter_mut() {
            if t.id == "project_reset" {
                t.from = vec!["pending".to_string()];
            }
        }
        let app = TestApp::with_workflow(workflow);
        let author = app.user(&[Role::Organization]);
        let project = app.seed_project(&author, ProjectState::Draft).await;

        let resp = app
            .send(Method::POST, &transition_uri(project.id, "reset"), Some(&author), None)
            .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
