use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use db::test_utils::seed_class;
use serde_json::{Value, json};
use tower::ServiceExt;
use util::identity::Role;

use crate::helpers::{make_test_app, token_for};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn start_request(token: Option<&str>, class_id: i64) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/api/attendance/start")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(json!({ "classId": class_id }).to_string()))
        .unwrap()
}

fn session_request(token: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/attendance/session")
        .method("GET")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn start_requires_authentication() {
    let (app, _state) = make_test_app().await;
    let (status, json) = send(&app, start_request(None, 1)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Authentication required");
}

#[tokio::test]
async fn students_cannot_start_sessions() {
    let (app, state) = make_test_app().await;
    let class = seed_class(state.db(), "COS 332", "t1", &["s1"]).await;
    let token = token_for("s1", Role::Student);

    let (status, json) = send(&app, start_request(Some(&token), class.id)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Teacher access required");
    assert!(state.session().info().await.is_none());
}

#[tokio::test]
async fn start_unknown_class_is_not_found() {
    let (app, _state) = make_test_app().await;
    let token = token_for("t1", Role::Teacher);

    let (status, json) = send(&app, start_request(Some(&token), 404)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Class not found");
}

#[tokio::test]
async fn teacher_starts_session_and_reads_it_back() {
    let (app, state) = make_test_app().await;
    let class = seed_class(state.db(), "COS 332", "t1", &["s1", "s2"]).await;
    let teacher = token_for("t1", Role::Teacher);

    let (status, json) = send(&app, session_request(&teacher)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No active attendance session");

    let (status, json) = send(&app, start_request(Some(&teacher), class.id)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["classId"], class.id);
    assert!(json["data"]["startedAt"].is_string());

    let student = token_for("s1", Role::Student);
    let (status, json) = send(&app, session_request(&student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["classId"], class.id);
    assert_eq!(json["data"]["total"], 0);
}
