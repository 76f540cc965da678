//! Enrollment (user-course) endpoints and progress statistics.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    status, Course, CreateEnrollmentRequest, Enrollment, EnrollmentWithCourse,
    UpdateEnrollmentRequest, User,
};
use crate::planner::stats::{self, EnrollmentStats};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_ects, validate_grade, validate_status, validate_uuid};

const ENROLLMENT_WITH_COURSE_SQL: &str = r#"
    SELECT e.id, e.user_id, e.course_id, e.status, e.grade, e.ects,
           e.created_at, e.updated_at,
           c.course_code AS course_code, c.title AS course_title, c.ects AS course_ects
    FROM enrollments e
    JOIN courses c ON c.id = e.course_id
"#;

async fn fetch_enrollments(
    db: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{ENROLLMENT_WITH_COURSE_SQL} WHERE e.user_id = ? ORDER BY e.created_at"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// List the authenticated user's enrollments with course details.
pub async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<EnrollmentWithCourse>>, ApiError> {
    let enrollments = fetch_enrollments(&state.db, &user.id).await?;
    Ok(Json(enrollments))
}

/// Progress statistics over the authenticated user's full enrollment list.
pub async fn enrollment_stats(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<EnrollmentStats>, ApiError> {
    let enrollments = fetch_enrollments(&state.db, &user.id).await?;
    Ok(Json(stats::summarize(&enrollments)))
}

/// Add a course to the authenticated user's plan.
pub async fn create_enrollment(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    if let Err(e) = validate_uuid(&req.course_id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }
    let enrollment_status = req.status.as_deref().unwrap_or(status::PLANNED);
    if let Err(e) = validate_status(enrollment_status) {
        return Err(ApiError::validation_field("status", e));
    }

    let course: Option<Course> = sqlx::query_as("SELECT * FROM courses WHERE id = ?")
        .bind(&req.course_id)
        .fetch_optional(&state.db)
        .await?;
    if course.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO enrollments (id, user_id, course_id, status, grade, ects, created_at, updated_at)
        VALUES (?, ?, ?, ?, NULL, NULL, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&req.course_id)
    .bind(enrollment_status)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("Course is already in your plan")
        } else {
            tracing::error!("Failed to create enrollment: {}", e);
            ApiError::database("Failed to create enrollment")
        }
    })?;

    let enrollment = sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

fn validate_update_request(req: &UpdateEnrollmentRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref value) = req.status {
        if let Err(e) = validate_status(value) {
            errors.add("status", e);
        }
    }
    if let Some(grade) = req.grade {
        if let Err(e) = validate_grade(grade) {
            errors.add("grade", e);
        }
    }
    if let Some(ects) = req.ects {
        if let Err(e) = validate_ects(ects) {
            errors.add("ects", e);
        }
    }
    errors.finish()
}

/// Partially update an enrollment (status, grade, ECTS override).
pub async fn update_enrollment(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    Json(req): Json<UpdateEnrollmentRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    if let Err(e) = validate_uuid(&id, "enrollment_id") {
        return Err(ApiError::validation_field("enrollment_id", e));
    }
    validate_update_request(&req)?;

    // Ownership check
    let existing: Option<Enrollment> =
        sqlx::query_as("SELECT * FROM enrollments WHERE id = ? AND user_id = ?")
            .bind(&id)
            .bind(&user.id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Enrollment not found"));
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE enrollments SET
            status = COALESCE(?, status),
            grade = COALESCE(?, grade),
            ects = COALESCE(?, ects),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.status)
    .bind(req.grade)
    .bind(req.ects)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let enrollment = sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(enrollment))
}

/// Remove a course from the authenticated user's plan.
pub async fn delete_enrollment(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "enrollment_id") {
        return Err(ApiError::validation_field("enrollment_id", e));
    }

    let result = sqlx::query("DELETE FROM enrollments WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Enrollment not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
