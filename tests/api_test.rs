//! End-to-end API tests against an in-process router with a temporary
//! SQLite database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use uniplan::config::Config;
use uniplan::{api, db, AppState};

const ADMIN_EMAIL: &str = "admin@test.local";
const ADMIN_PASSWORD: &str = "admin-password-1";

async fn setup() -> (Router, db::DbPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::init(dir.path()).await.unwrap();

    let mut config = Config::default();
    config.auth.admin_email = ADMIN_EMAIL.to_string();
    config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());

    api::auth::ensure_admin_user(&pool, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    let state = Arc::new(AppState::new(config, pool.clone()));
    (api::create_router(state), pool, dir)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Fetch the outstanding verification code straight from the database, the
/// way a user would read it from their inbox.
async fn verification_code_for(pool: &db::DbPool, email: &str) -> String {
    let (code,): (String,) = sqlx::query_as(
        "SELECT c.code FROM verification_codes c \
         JOIN users u ON u.id = c.user_id WHERE u.email = ?",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();
    code
}

/// Register, verify and log in a fresh student account, returning the token.
async fn login_student(app: &Router, pool: &db::DbPool, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": email, "password": "student-pass-1", "name": "Test Student" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let code = verification_code_for(pool, email).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            json!({ "email": email, "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": email, "password": "student-pass-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_requires_verified_email() {
    let (app, _pool, _dir) = setup().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "new@test.local", "password": "student-pass-1", "name": "New" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["is_verified"], json!(false));
    // password hash must not leak
    assert!(body.get("password_hash").is_none());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "new@test.local", "password": "student-pass-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_verification_code_is_single_use() {
    let (app, pool, _dir) = setup().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "once@test.local", "password": "student-pass-1", "name": "Once" }),
        ))
        .await
        .unwrap();

    let code = verification_code_for(&pool, "once@test.local").await;

    let wrong = if code == "000000" { "000001" } else { "000000" };
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            json!({ "email": "once@test.local", "code": wrong }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            json!({ "email": "once@test.local", "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // the code is deleted after success, replaying it fails
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            json!({ "email": "once@test.local", "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_code_rejected_and_resend_replaces_it() {
    let (app, pool, _dir) = setup().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "late@test.local", "password": "student-pass-1", "name": "Late" }),
        ))
        .await
        .unwrap();

    let expired_code = verification_code_for(&pool, "late@test.local").await;

    // backdate the outstanding code past its ten-minute window
    let past = (chrono::Utc::now() - chrono::Duration::minutes(1)).to_rfc3339();
    sqlx::query(
        "UPDATE verification_codes SET expires_at = ? \
         WHERE user_id = (SELECT id FROM users WHERE email = ?)",
    )
    .bind(&past)
    .bind("late@test.local")
    .execute(&pool)
    .await
    .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            json!({ "email": "late@test.local", "code": expired_code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/resend-code",
            json!({ "email": "late@test.local" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // the replacement code is fresh and verifies
    let fresh_code = verification_code_for(&pool, "late@test.local").await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            json!({ "email": "late@test.local", "code": fresh_code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_validate_endpoint() {
    let (app, pool, _dir) = setup().await;
    let token = login_student(&app, &pool, "session@test.local").await;

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/auth/validate", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(authed_request(
            "GET",
            "/api/auth/validate",
            "not-a-real-token",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _pool, _dir) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/courses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_enrollment_flow_and_stats() {
    let (app, pool, _dir) = setup().await;
    let token = login_student(&app, &pool, "student@test.local").await;

    // pick a seeded catalog course
    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/courses", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let courses = read_json(response).await;
    let course = courses
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["course_code"] == "VL.ALGEBRA")
        .unwrap();
    let course_id = course["id"].as_str().unwrap().to_string();
    let course_ects = course["ects"].as_f64().unwrap();
    assert_eq!(course["is_steop_required"], json!(true));

    // enroll
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/user/courses",
            &token,
            Some(json!({ "course_id": course_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let enrollment = read_json(response).await;
    assert_eq!(enrollment["status"], json!("planned"));
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();

    // duplicate enrollment is rejected
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/user/courses",
            &token,
            Some(json!({ "course_id": course_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // complete it with a grade
    let response = app
        .clone()
        .oneshot(authed_request(
            "PUT",
            &format!("/api/user/courses/{enrollment_id}"),
            &token,
            Some(json!({ "status": "completed", "grade": 2.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/user/courses/stats", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = read_json(response).await;
    assert_eq!(stats["total_courses"], json!(1));
    assert_eq!(stats["completed_courses"], json!(1));
    assert_eq!(stats["total_ects"].as_f64().unwrap(), course_ects);
    assert_eq!(stats["current_gpa"].as_f64().unwrap(), 2.0);

    // delete and confirm 404 on the second attempt
    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/user/courses/{enrollment_id}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/user/courses/{enrollment_id}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_single_active_semester() {
    let (app, pool, _dir) = setup().await;
    let token = login_student(&app, &pool, "semester@test.local").await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/semesters",
            &token,
            Some(json!({ "name": "WS 2025", "year": 2025, "semester_type": "WS", "is_active": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = read_json(response).await;
    assert_eq!(first["is_active"], json!(true));

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/semesters",
            &token,
            Some(json!({ "name": "SS 2026", "year": 2026, "semester_type": "SS", "is_active": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let second = read_json(response).await;

    let response = app
        .oneshot(authed_request("GET", "/api/semesters", &token, None))
        .await
        .unwrap();
    let semesters = read_json(response).await;
    let active: Vec<&Value> = semesters
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["is_active"] == json!(true))
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], second["id"]);
}

#[tokio::test]
async fn test_admin_endpoints_require_role() {
    let (app, pool, _dir) = setup().await;
    let student_token = login_student(&app, &pool, "plain@test.local").await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/admin/seed-courses",
            &student_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // the startup admin account is pre-verified and can log in directly
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let admin_token = body["token"].as_str().unwrap();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/admin/seed-courses",
            admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_activity_time_range_validated() {
    let (app, pool, _dir) = setup().await;
    let token = login_student(&app, &pool, "cal@test.local").await;

    // end before start is rejected
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/activities",
            &token,
            Some(json!({
                "title": "Backwards",
                "activity_type": "lecture",
                "start_time": "2026-03-02T10:00:00+00:00",
                "end_time": "2026-03-02T09:00:00+00:00"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/activities",
            &token,
            Some(json!({
                "title": "Lecture",
                "activity_type": "lecture",
                "start_time": "2026-03-02T10:00:00+00:00",
                "end_time": "2026-03-02T12:00:00+00:00"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // the activity lands on its day in the month grid
    let response = app
        .oneshot(authed_request(
            "GET",
            "/api/calendar?date=2026-03-15&view=month",
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let calendar = read_json(response).await;
    let day = calendar["days"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["date"] == json!("2026-03-02"))
        .unwrap();
    assert_eq!(day["activities"].as_array().unwrap().len(), 1);
    assert_eq!(day["activities"][0]["title"], json!("Lecture"));
}
