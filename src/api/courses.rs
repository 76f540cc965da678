//! Course catalog endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::QueryBuilder;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Course, CourseFilter, CourseResponse, CreateCourseRequest, User};
use crate::planner::steop;
use crate::AppState;

use super::auth::require_admin;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_course_code, validate_course_type, validate_ects, validate_semester_type,
    validate_uuid,
};

fn validate_create_request(req: &CreateCourseRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_course_code(&req.course_code) {
        errors.add("course_code", e);
    }
    if req.title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    if let Err(e) = validate_ects(req.ects) {
        errors.add("ects", e);
    }
    if let Err(e) = validate_semester_type(&req.semester) {
        errors.add("semester", e);
    }
    if let Err(e) = validate_course_type(&req.course_type) {
        errors.add("course_type", e);
    }
    if req.faculty.trim().is_empty() {
        errors.add("faculty", "Faculty is required");
    }
    if let Some(prerequisites) = &req.prerequisites {
        for code in prerequisites {
            if let Err(e) = validate_course_code(code) {
                errors.add("prerequisites", e);
            }
        }
    }

    errors.finish()
}

/// List catalog courses, optionally filtered.
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("SELECT * FROM courses WHERE 1=1");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        query.push(" AND (title LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR course_code LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(faculty) = filter.faculty.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND faculty = ");
        query.push_bind(faculty.to_string());
    }
    if let Some(semester) = filter.semester.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND semester = ");
        query.push_bind(semester.to_string());
    }
    if let Some(course_type) = filter.course_type.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND course_type = ");
        query.push_bind(course_type.to_string());
    }

    query.push(" ORDER BY course_code");

    let courses: Vec<Course> = query.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(courses.iter().map(Course::to_response).collect()))
}

/// Get a single catalog course.
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    if let Err(e) = validate_uuid(&id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    Ok(Json(course.to_response()))
}

/// Create a catalog course (admin only). STEOP flags are derived from the
/// course code when not supplied.
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    require_admin(&user)?;
    validate_create_request(&req)?;

    let flags = steop::classify(&req.course_code);
    let is_steop_required = req.is_steop_required.unwrap_or(flags.required);
    let is_steop_allowed = req.is_steop_allowed.unwrap_or(flags.allowed);

    let prerequisites = serde_json::to_string(&req.prerequisites.unwrap_or_default())
        .map_err(|e| ApiError::internal(format!("Failed to encode prerequisites: {e}")))?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, course_code, title, ects, semester, faculty, course_type,
             language, prerequisites, is_steop_required, is_steop_allowed,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.course_code)
    .bind(req.title.trim())
    .bind(req.ects)
    .bind(&req.semester)
    .bind(req.faculty.trim())
    .bind(&req.course_type)
    .bind(req.language.as_deref().unwrap_or("de"))
    .bind(&prerequisites)
    .bind(is_steop_required)
    .bind(is_steop_allowed)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("A course with this code already exists")
        } else {
            tracing::error!("Failed to create course: {}", e);
            ApiError::database("Failed to create course")
        }
    })?;

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(course.to_response())))
}

/// Re-run the catalog seeder (admin only). Replaces the old static-key
/// maintenance endpoint.
pub async fn seed_courses(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;

    crate::db::seed_course_catalog(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Catalog seeding failed: {}", e);
            ApiError::internal("Catalog seeding failed")
        })?;

    Ok(StatusCode::NO_CONTENT)
}
