//! Calendar activity, activity-type, and template models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub activity_type: String,
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

/// User-defined activity category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityType {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub created_at: String,
}

/// Reusable activity template with optional default time range.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub activity_type: String,
    pub color: String,
    pub default_start: Option<String>,
    pub default_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub activity_type: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub activity_type: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityTypeRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityTypeRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub activity_type: String,
    pub color: Option<String>,
    pub default_start: Option<String>,
    pub default_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub activity_type: Option<String>,
    pub color: Option<String>,
    pub default_start: Option<String>,
    pub default_end: Option<String>,
}
