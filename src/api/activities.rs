//! Calendar activity, activity-type, and template endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    Activity, ActivityType, CreateActivityRequest, CreateActivityTypeRequest,
    CreateTemplateRequest, Template, UpdateActivityRequest, UpdateActivityTypeRequest,
    UpdateTemplateRequest, User,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_color, validate_time_range, validate_timestamp, validate_uuid};

const DEFAULT_COLOR: &str = "#3b82f6";

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

fn validate_create_activity(req: &CreateActivityRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    if req.activity_type.trim().is_empty() {
        errors.add("activity_type", "Activity type is required");
    }
    if let Err(e) = validate_time_range(&req.start_time, &req.end_time) {
        errors.add("end_time", e);
    }
    if let Some(ref color) = req.color {
        if let Err(e) = validate_color(color) {
            errors.add("color", e);
        }
    }
    errors.finish()
}

/// List the authenticated user's activities.
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE user_id = ? ORDER BY start_time",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(activities))
}

/// Create an activity. The time range must be well-formed: activities with
/// end_time before start_time are rejected.
pub async fn create_activity(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    validate_create_activity(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO activities
            (id, user_id, title, description, start_time, end_time, activity_type, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(&req.start_time)
    .bind(&req.end_time)
    .bind(&req.activity_type)
    .bind(req.color.as_deref().unwrap_or(DEFAULT_COLOR))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(activity)))
}

/// Partially update an activity; the resulting time range is re-validated.
pub async fn update_activity(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    Json(req): Json<UpdateActivityRequest>,
) -> Result<Json<Activity>, ApiError> {
    if let Err(e) = validate_uuid(&id, "activity_id") {
        return Err(ApiError::validation_field("activity_id", e));
    }

    let existing: Option<Activity> =
        sqlx::query_as("SELECT * FROM activities WHERE id = ? AND user_id = ?")
            .bind(&id)
            .bind(&user.id)
            .fetch_optional(&state.db)
            .await?;
    let existing = existing.ok_or_else(|| ApiError::not_found("Activity not found"))?;

    let mut errors = ValidationErrorBuilder::new();
    let start = req.start_time.as_deref().unwrap_or(&existing.start_time);
    let end = req.end_time.as_deref().unwrap_or(&existing.end_time);
    if let Err(e) = validate_time_range(start, end) {
        errors.add("end_time", e);
    }
    if let Some(ref color) = req.color {
        if let Err(e) = validate_color(color) {
            errors.add("color", e);
        }
    }
    if let Some(ref title) = req.title {
        if title.trim().is_empty() {
            errors.add("title", "Title must not be empty");
        }
    }
    errors.finish()?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE activities SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            start_time = COALESCE(?, start_time),
            end_time = COALESCE(?, end_time),
            activity_type = COALESCE(?, activity_type),
            color = COALESCE(?, color),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.start_time)
    .bind(&req.end_time)
    .bind(&req.activity_type)
    .bind(&req.color)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(activity))
}

/// Delete an activity.
pub async fn delete_activity(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "activity_id") {
        return Err(ApiError::validation_field("activity_id", e));
    }

    let result = sqlx::query("DELETE FROM activities WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Activity not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Activity types
// ---------------------------------------------------------------------------

/// List the authenticated user's activity types.
pub async fn list_activity_types(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<ActivityType>>, ApiError> {
    let types = sqlx::query_as::<_, ActivityType>(
        "SELECT * FROM activity_types WHERE user_id = ? ORDER BY name",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(types))
}

/// Create an activity type; names are unique per user.
pub async fn create_activity_type(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateActivityTypeRequest>,
) -> Result<(StatusCode, Json<ActivityType>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
    if let Some(ref color) = req.color {
        if let Err(e) = validate_color(color) {
            errors.add("color", e);
        }
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO activity_types (id, user_id, name, color) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&user.id)
        .bind(req.name.trim())
        .bind(req.color.as_deref().unwrap_or(DEFAULT_COLOR))
        .execute(&state.db)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                ApiError::conflict("An activity type with this name already exists")
            } else {
                tracing::error!("Failed to create activity type: {}", e);
                ApiError::database("Failed to create activity type")
            }
        })?;

    let activity_type =
        sqlx::query_as::<_, ActivityType>("SELECT * FROM activity_types WHERE id = ?")
            .bind(&id)
            .fetch_one(&state.db)
            .await?;

    Ok((StatusCode::CREATED, Json(activity_type)))
}

/// Rename or recolor an activity type.
pub async fn update_activity_type(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    Json(req): Json<UpdateActivityTypeRequest>,
) -> Result<Json<ActivityType>, ApiError> {
    if let Err(e) = validate_uuid(&id, "activity_type_id") {
        return Err(ApiError::validation_field("activity_type_id", e));
    }
    if let Some(ref color) = req.color {
        if let Err(e) = validate_color(color) {
            return Err(ApiError::validation_field("color", e));
        }
    }

    let existing: Option<ActivityType> =
        sqlx::query_as("SELECT * FROM activity_types WHERE id = ? AND user_id = ?")
            .bind(&id)
            .bind(&user.id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Activity type not found"));
    }

    sqlx::query(
        "UPDATE activity_types SET name = COALESCE(?, name), color = COALESCE(?, color) WHERE id = ?",
    )
    .bind(&req.name)
    .bind(&req.color)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let activity_type =
        sqlx::query_as::<_, ActivityType>("SELECT * FROM activity_types WHERE id = ?")
            .bind(&id)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(activity_type))
}

/// Delete an activity type.
pub async fn delete_activity_type(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "activity_type_id") {
        return Err(ApiError::validation_field("activity_type_id", e));
    }

    let result = sqlx::query("DELETE FROM activity_types WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Activity type not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn validate_create_template(req: &CreateTemplateRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
    if req.title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    if req.activity_type.trim().is_empty() {
        errors.add("activity_type", "Activity type is required");
    }
    if let Some(ref color) = req.color {
        if let Err(e) = validate_color(color) {
            errors.add("color", e);
        }
    }
    if let Some(ref start) = req.default_start {
        if let Err(e) = validate_timestamp(start, "default_start") {
            errors.add("default_start", e);
        }
    }
    if let Some(ref end) = req.default_end {
        if let Err(e) = validate_timestamp(end, "default_end") {
            errors.add("default_end", e);
        }
    }
    errors.finish()
}

/// List the authenticated user's templates.
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<Template>>, ApiError> {
    let templates =
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE user_id = ? ORDER BY name")
            .bind(&user.id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(templates))
}

/// Create a reusable activity template.
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    validate_create_template(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO templates
            (id, user_id, name, title, description, activity_type, color,
             default_start, default_end, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(req.name.trim())
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(&req.activity_type)
    .bind(req.color.as_deref().unwrap_or(DEFAULT_COLOR))
    .bind(&req.default_start)
    .bind(&req.default_end)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// Partially update a template.
pub async fn update_template(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>, ApiError> {
    if let Err(e) = validate_uuid(&id, "template_id") {
        return Err(ApiError::validation_field("template_id", e));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref color) = req.color {
        if let Err(e) = validate_color(color) {
            errors.add("color", e);
        }
    }
    if let Some(ref start) = req.default_start {
        if let Err(e) = validate_timestamp(start, "default_start") {
            errors.add("default_start", e);
        }
    }
    if let Some(ref end) = req.default_end {
        if let Err(e) = validate_timestamp(end, "default_end") {
            errors.add("default_end", e);
        }
    }
    errors.finish()?;

    let existing: Option<Template> =
        sqlx::query_as("SELECT * FROM templates WHERE id = ? AND user_id = ?")
            .bind(&id)
            .bind(&user.id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Template not found"));
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE templates SET
            name = COALESCE(?, name),
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            activity_type = COALESCE(?, activity_type),
            color = COALESCE(?, color),
            default_start = COALESCE(?, default_start),
            default_end = COALESCE(?, default_end),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.activity_type)
    .bind(&req.color)
    .bind(&req.default_start)
    .bind(&req.default_end)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(template))
}

/// Delete a template.
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "template_id") {
        return Err(ApiError::validation_field("template_id", e));
    }

    let result = sqlx::query("DELETE FROM templates WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Template not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
