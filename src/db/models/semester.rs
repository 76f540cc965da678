//! Semester container models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::course::CourseResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Semester {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub year: i64,
    pub semester_type: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Semester with its courses for the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct SemesterWithCourses {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub year: i64,
    pub semester_type: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub courses: Vec<CourseResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSemesterRequest {
    pub name: String,
    pub year: i64,
    pub semester_type: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSemesterRequest {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub semester_type: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddSemesterCourseRequest {
    pub course_id: String,
}
