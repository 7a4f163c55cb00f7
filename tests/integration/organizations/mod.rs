//! Organization manager handler integration tests

use atelier_auth::Role;
use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{parse_body, TestApp};

#[tokio::test]
async fn test_organization_adds_and_lists_managers() {
    let app = TestApp::new();
    let organization = app.user(&[Role::Organization]);
    let manager = app.user(&[Role::Manager]);
    let uri = format!("/api/organizations/{}/managers", organization.id);

    let resp = app
        .send(
            Method::POST,
            &uri,
            Some(&organization),
            Some(json!({"manager_id": manager.id})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.send(Method::GET, &uri, Some(&manager), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = parse_body(resp).await;
    assert_eq!(body["managers"], json!([manager.id]));
}

#[tokio::test]
async fn test_stranger_cannot_manage_managers() {
    let app = TestApp::new();
    let organization = app.user(&[Role::Organization]);
    let stranger = app.user(&[Role::Manager]);
    let uri = format!("/api/organizations/{}/managers", organization.id);

    let resp = app
        .send(
            Method::POST,
            &uri,
            Some(&stranger),
            Some(json!({"manager_id": stranger.id})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app.send(Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_administrator_adds_manager() {
    let app = TestApp::new();
    let organization = app.user(&[Role::Organization]);
    let admin = app.user(&[Role::Administrator]);
    let manager = app.user(&[Role::Manager]);

    let resp = app
        .send(
            Method::POST,
            &format!("/api/organizations/{}/managers", organization.id),
            Some(&admin),
            Some(json!({"manager_id": manager.id})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_manager_id_is_validation_error() {
    let app = TestApp::new();
    let organization = app.user(&[Role::Organization]);

    let resp = app
        .send(
            Method::POST,
            &format!("/api/organizations/{}/managers", organization.id),
            Some(&organization),
            Some(json!({"manager_id": "not-a-uuid"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(resp).await["error"]["code"], "VALIDATION_ERROR");
}
