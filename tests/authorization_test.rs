//! Role checks on every help endpoint

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::fixtures::{
    authed, TestApp, UnavailableAuthenticator, ADMIN_TOKEN, NO_ROLE_TOKEN, USER_ID, USER_TOKEN,
};
use serde_json::json;
use std::sync::Arc;

fn member_requests() -> Vec<test::TestRequest> {
    vec![
        test::TestRequest::get().uri("/api/help"),
        test::TestRequest::get().uri("/api/help/1"),
        test::TestRequest::get().uri("/api/help/helptype"),
        test::TestRequest::get().uri("/api/help/resources/1"),
        test::TestRequest::get().uri("/api/help/comments/1"),
        test::TestRequest::get().uri("/api/help/support/1"),
        test::TestRequest::post()
            .uri("/api/help")
            .set_json(json!({ "title": "t", "description": "d" })),
        test::TestRequest::put()
            .uri("/api/help")
            .set_json(json!({ "title": "t", "description": "d" })),
        test::TestRequest::post()
            .uri("/api/help/comments")
            .set_json(json!({ "help_id": 1, "comment": "c" })),
        test::TestRequest::post()
            .uri("/api/help/support")
            .set_json(json!({ "help_id": 1, "help_type_id": 1, "message": "m" })),
    ]
}

#[actix_rt::test]
async fn test_anonymous_is_unauthorized() {
    let app = TestApp::new();
    app.seed_help(USER_ID, "Groceries").await;

    for req in member_requests() {
        let (status, body) = app.send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }
    assert_eq!(app.repo.saves(), 1);
}

#[actix_rt::test]
async fn test_unknown_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app
        .send(authed(test::TestRequest::get().uri("/api/help"), "forged"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_member_without_roles_is_forbidden() {
    let app = TestApp::new();

    for req in member_requests() {
        let (status, body) = app.send(authed(req, NO_ROLE_TOKEN)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], json!(["Insufficient permissions."]));
    }
}

#[actix_rt::test]
async fn test_help_type_creation_is_admin_only() {
    let app = TestApp::new();

    let (status, _) = app
        .send(authed(
            test::TestRequest::post()
                .uri("/api/help/helptype")
                .set_json(json!({ "name": "Transport" })),
            USER_TOKEN,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.service().get_help_types().await.unwrap().is_empty());

    let (status, _) = app
        .send(authed(
            test::TestRequest::post()
                .uri("/api/help/helptype")
                .set_json(json!({ "name": "Transport" })),
            ADMIN_TOKEN,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_rt::test]
async fn test_admin_can_use_member_endpoints() {
    let app = TestApp::new();
    let help = app.seed_help(USER_ID, "Groceries").await;

    let (status, _) = app
        .send(authed(
            test::TestRequest::get().uri(&format!("/api/help/{}", help.id.unwrap())),
            ADMIN_TOKEN,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_role_check_precedes_input_parsing() {
    let app = TestApp::new();
    let malformed = || {
        test::TestRequest::post()
            .uri("/api/help")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
    };

    let (status, body) = app.send(malformed()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!(["Authentication required."]));

    let (status, _) = app
        .send(test::TestRequest::get().uri("/api/help/abc"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(authed(
            test::TestRequest::post()
                .uri("/api/help/helptype")
                .set_json(json!({ "name": "" })),
            USER_TOKEN,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Authenticated callers get the input error.
    let (status, body) = app.send(authed(malformed(), USER_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!(["Invalid Input detected."]));

    let (status, body) = app
        .send(authed(test::TestRequest::get().uri("/api/help/abc"), USER_TOKEN))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!(["Invalid Id"]));
}

#[actix_rt::test]
async fn test_unavailable_authenticator_is_server_error() {
    let app = TestApp::with_authenticator(Arc::new(UnavailableAuthenticator));

    let (status, body) = app
        .send(authed(test::TestRequest::get().uri("/api/help"), USER_TOKEN))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], json!(["Internal server error."]));

    // Without a token the authenticator is never consulted.
    let (status, _) = app.send(test::TestRequest::get().uri("/api/help")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
