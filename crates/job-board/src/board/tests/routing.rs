use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::board::domain::{Role, User};
use crate::board::router::{board_router, USER_ID_HEADER, USER_ROLE_HEADER};

fn app(board: MemoryBoard) -> Router {
    board_router(Arc::new(board))
}

fn request(method: Method, uri: &str, caller: Option<&User>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = caller {
        builder = builder
            .header(USER_ID_HEADER, user.id.as_str())
            .header(USER_ROLE_HEADER, user.role.label());
    }
    match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

fn job_payload(company_id: &str) -> Value {
    json!({
        "title": "Backend Engineer",
        "description": "Own the API",
        "requirements": "Rust,SQL",
        "salary": "110000",
        "location": "Remote",
        "job_type": "Full-time",
        "experience_level": 2,
        "position": 1,
        "company_id": company_id,
    })
}

#[tokio::test]
async fn register_user_returns_created() {
    let (board, _, _, _) = build_board();

    let response = app(board)
        .oneshot(request(
            Method::POST,
            "/api/v1/users",
            None,
            Some(json!({
                "full_name": "Ada Student",
                "email": "ada@example.com",
                "role": "student",
            })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["role"], "student");
    assert_eq!(body["profile"]["skills"], json!([]));
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let (board, _, _, _) = build_board();

    let response = app(board)
        .oneshot(request(
            Method::POST,
            "/api/v1/companies",
            None,
            Some(json!({ "name": "Acme" })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn student_cannot_register_company() {
    let (board, _, _, _) = build_board();
    let ada = student(&board, "Ada Student");

    let response = app(board)
        .oneshot(request(
            Method::POST,
            "/api/v1/companies",
            Some(&ada),
            Some(json!({ "name": "Acme" })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "recruiter role required");
}

#[tokio::test]
async fn recruiter_posts_job_with_text_fields() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let acme = company(&board, &owner, "Acme");

    let response = app(board)
        .oneshot(request(
            Method::POST,
            "/api/v1/jobs",
            Some(&owner),
            Some(job_payload(acme.id.as_str())),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["requirements"], json!(["Rust", "SQL"]));
    assert_eq!(body["salary"], 110_000);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn posting_for_inactive_company_is_unprocessable() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let acme = company(&board, &owner, "Acme");
    board.companies.set_active(&acme.id, false).expect("off");

    let response = app(board)
        .oneshot(request(
            Method::POST,
            "/api/v1/jobs",
            Some(&owner),
            Some(job_payload(acme.id.as_str())),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn posting_without_company_is_bad_request() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);

    let mut payload = job_payload("ignored");
    payload["company_id"] = Value::Null;
    let response = app(board)
        .oneshot(request(Method::POST, "/api/v1/jobs", Some(&owner), Some(payload)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_application_is_conflict() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let acme = company(&board, &owner, "Acme");
    let job = post(&board, &acme, &owner, "Backend Engineer");
    let ada = student(&board, "Ada Student");
    let router = app(board);
    let uri = format!("/api/v1/jobs/{}/applications", job.id);

    let first = router
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&ada), None))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .oneshot(request(Method::POST, &uri, Some(&ada), None))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deactivation_reports_rejected_jobs() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let acme = company(&board, &owner, "Acme");
    post(&board, &acme, &owner, "Backend Engineer");

    let response = app(board)
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/companies/{}/status", acme.id),
            Some(&owner),
            Some(json!({ "is_active": false })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["jobs_rejected"], 1);
    assert_eq!(body["company"]["is_active"], false);
}

#[tokio::test]
async fn job_search_filters_by_keyword_query() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let acme = company(&board, &owner, "Acme");
    post(&board, &acme, &owner, "Backend Engineer");
    post(&board, &acme, &owner, "Product Designer");

    let response = app(board)
        .oneshot(request(Method::GET, "/api/v1/jobs?keyword=designer", None, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let jobs = body.as_array().expect("array");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["title"], "Product Designer");
    assert_eq!(jobs[0]["company_details"]["name"], "Acme");
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (board, _, _, _) = build_board();

    let response = app(board)
        .oneshot(request(Method::GET, "/api/v1/jobs/job-missing", None, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().expect("message").contains("not found"));
}

#[tokio::test]
async fn recruiter_updates_application_status() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let acme = company(&board, &owner, "Acme");
    let job = post(&board, &acme, &owner, "Backend Engineer");
    let ada = register(&board, "Ada Student", Role::Student);
    let application = board.applications.apply(&job.id, &ada.id).expect("applies");

    let response = app(board)
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/applications/{}/status", application.id),
            Some(&owner),
            Some(json!({ "status": "Accepted" })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn other_recruiter_cannot_deactivate_company() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let rival = register(&board, "Otto Recruiter", Role::Recruiter);
    let acme = company(&board, &owner, "Acme");
    post(&board, &acme, &owner, "Backend Engineer");
    let board = Arc::new(board);

    let response = board_router(board.clone())
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/companies/{}/status", acme.id),
            Some(&rival),
            Some(json!({ "is_active": false })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().expect("message").contains("another recruiter"));
    assert!(board.companies.get(&acme.id).expect("company").is_active);
}

#[tokio::test]
async fn other_recruiter_cannot_touch_foreign_jobs_or_applications() {
    let (board, _, _, _) = build_board();
    let owner = recruiter(&board);
    let rival = register(&board, "Otto Recruiter", Role::Recruiter);
    let acme = company(&board, &owner, "Acme");
    let rival_co = company(&board, &rival, "Rival Co");
    let job = post(&board, &acme, &owner, "Backend Engineer");
    let ada = register(&board, "Ada Student", Role::Student);
    let application = board.applications.apply(&job.id, &ada.id).expect("applies");
    let router = app(board);

    let attempts = [
        request(Method::DELETE, &format!("/api/v1/companies/{}", acme.id), Some(&rival), None),
        request(
            Method::POST,
            "/api/v1/jobs",
            Some(&rival),
            Some(job_payload(acme.id.as_str())),
        ),
        request(
            Method::PUT,
            &format!("/api/v1/jobs/{}", job.id),
            Some(&rival),
            Some(job_payload(rival_co.id.as_str())),
        ),
        request(
            Method::PUT,
            &format!("/api/v1/jobs/{}", job.id),
            Some(&owner),
            Some(job_payload(rival_co.id.as_str())),
        ),
        request(
            Method::GET,
            &format!("/api/v1/jobs/{}/applications", job.id),
            Some(&rival),
            None,
        ),
        request(
            Method::PUT,
            &format!("/api/v1/applications/{}/status", application.id),
            Some(&rival),
            Some(json!({ "status": "rejected" })),
        ),
    ];

    for attempt in attempts {
        let uri = attempt.uri().to_string();
        let response = router.clone().oneshot(attempt).await.expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let owner_view = router
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/jobs/{}/applications", job.id),
            Some(&owner),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(owner_view.status(), StatusCode::OK);
    let body = read_json_body(owner_view).await;
    assert_eq!(body.as_array().expect("array").len(), 1);
    assert_eq!(body[0]["status"], "pending");
}
