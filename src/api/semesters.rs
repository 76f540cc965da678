//! Semester endpoints, including the single-active-semester invariant and
//! nested semester-course membership.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    AddSemesterCourseRequest, Course, CreateSemesterRequest, Semester, SemesterWithCourses,
    UpdateSemesterRequest, User,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_semester_type, validate_uuid, validate_year};

fn validate_create_request(req: &CreateSemesterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
    if let Err(e) = validate_year(req.year) {
        errors.add("year", e);
    }
    if let Err(e) = validate_semester_type(&req.semester_type) {
        errors.add("semester_type", e);
    }
    errors.finish()
}

fn validate_update_request(req: &UpdateSemesterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            errors.add("name", "Name must not be empty");
        }
    }
    if let Some(year) = req.year {
        if let Err(e) = validate_year(year) {
            errors.add("year", e);
        }
    }
    if let Some(ref semester_type) = req.semester_type {
        if let Err(e) = validate_semester_type(semester_type) {
            errors.add("semester_type", e);
        }
    }
    errors.finish()
}

/// Load a semester and verify ownership.
async fn find_owned_semester(
    db: &sqlx::SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Semester, ApiError> {
    sqlx::query_as::<_, Semester>("SELECT * FROM semesters WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Semester not found"))
}

/// List the authenticated user's semesters.
pub async fn list_semesters(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<Semester>>, ApiError> {
    let semesters = sqlx::query_as::<_, Semester>(
        "SELECT * FROM semesters WHERE user_id = ? ORDER BY year, semester_type",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(semesters))
}

/// Create a semester. Activation is applied atomically: deactivating the
/// user's other semesters and inserting the new one happen in one
/// transaction, so at most one semester stays active per user.
pub async fn create_semester(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateSemesterRequest>,
) -> Result<(StatusCode, Json<Semester>), ApiError> {
    validate_create_request(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;

    if req.is_active {
        sqlx::query("UPDATE semesters SET is_active = 0, updated_at = ? WHERE user_id = ?")
            .bind(&now)
            .bind(&user.id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO semesters (id, user_id, name, year, semester_type, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(req.name.trim())
    .bind(req.year)
    .bind(&req.semester_type)
    .bind(req.is_active)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let semester = sqlx::query_as::<_, Semester>("SELECT * FROM semesters WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(semester)))
}

/// Get a semester with its courses.
pub async fn get_semester(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<Json<SemesterWithCourses>, ApiError> {
    if let Err(e) = validate_uuid(&id, "semester_id") {
        return Err(ApiError::validation_field("semester_id", e));
    }

    let semester = find_owned_semester(&state.db, &id, &user.id).await?;

    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT c.* FROM courses c
        JOIN semester_courses sc ON sc.course_id = c.id
        WHERE sc.semester_id = ?
        ORDER BY c.course_code
        "#,
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(SemesterWithCourses {
        id: semester.id,
        user_id: semester.user_id,
        name: semester.name,
        year: semester.year,
        semester_type: semester.semester_type,
        is_active: semester.is_active,
        created_at: semester.created_at,
        updated_at: semester.updated_at,
        courses: courses.iter().map(Course::to_response).collect(),
    }))
}

/// Update a semester; activating one atomically deactivates the rest.
pub async fn update_semester(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    Json(req): Json<UpdateSemesterRequest>,
) -> Result<Json<Semester>, ApiError> {
    if let Err(e) = validate_uuid(&id, "semester_id") {
        return Err(ApiError::validation_field("semester_id", e));
    }
    validate_update_request(&req)?;

    find_owned_semester(&state.db, &id, &user.id).await?;

    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;

    if req.is_active == Some(true) {
        sqlx::query("UPDATE semesters SET is_active = 0, updated_at = ? WHERE user_id = ? AND id != ?")
            .bind(&now)
            .bind(&user.id)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        UPDATE semesters SET
            name = COALESCE(?, name),
            year = COALESCE(?, year),
            semester_type = COALESCE(?, semester_type),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(req.year)
    .bind(&req.semester_type)
    .bind(req.is_active)
    .bind(&now)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let semester = sqlx::query_as::<_, Semester>("SELECT * FROM semesters WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(semester))
}

/// Delete a semester; its membership rows cascade.
pub async fn delete_semester(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "semester_id") {
        return Err(ApiError::validation_field("semester_id", e));
    }

    let result = sqlx::query("DELETE FROM semesters WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Semester not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// List the courses in a semester.
pub async fn list_semester_courses(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<Json<Vec<crate::db::CourseResponse>>, ApiError> {
    if let Err(e) = validate_uuid(&id, "semester_id") {
        return Err(ApiError::validation_field("semester_id", e));
    }

    find_owned_semester(&state.db, &id, &user.id).await?;

    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT c.* FROM courses c
        JOIN semester_courses sc ON sc.course_id = c.id
        WHERE sc.semester_id = ?
        ORDER BY c.course_code
        "#,
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(courses.iter().map(Course::to_response).collect()))
}

/// Add a course to a semester. A course can be in a semester at most once.
pub async fn add_semester_course(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    Json(req): Json<AddSemesterCourseRequest>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "semester_id") {
        return Err(ApiError::validation_field("semester_id", e));
    }
    if let Err(e) = validate_uuid(&req.course_id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }

    find_owned_semester(&state.db, &id, &user.id).await?;

    let course: Option<Course> = sqlx::query_as("SELECT * FROM courses WHERE id = ?")
        .bind(&req.course_id)
        .fetch_optional(&state.db)
        .await?;
    if course.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    sqlx::query("INSERT INTO semester_courses (id, semester_id, course_id) VALUES (?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(&req.course_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                ApiError::conflict("Course is already in this semester")
            } else {
                tracing::error!("Failed to add course to semester: {}", e);
                ApiError::database("Failed to add course to semester")
            }
        })?;

    Ok(StatusCode::CREATED)
}

/// Remove a course from a semester.
pub async fn remove_semester_course(
    State(state): State<Arc<AppState>>,
    user: User,
    Path((id, course_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "semester_id") {
        return Err(ApiError::validation_field("semester_id", e));
    }
    if let Err(e) = validate_uuid(&course_id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }

    find_owned_semester(&state.db, &id, &user.id).await?;

    let result =
        sqlx::query("DELETE FROM semester_courses WHERE semester_id = ? AND course_id = ?")
            .bind(&id)
            .bind(&course_id)
            .execute(&state.db)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Course is not in this semester"));
    }

    Ok(StatusCode::NO_CONTENT)
}
