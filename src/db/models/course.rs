//! Course catalog models and DTOs.
//!
//! Prerequisites are stored as a JSON array of course codes in a TEXT column
//! and expanded into a list in the API response.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub mod semester_types {
    pub const WINTER: &str = "WS";
    pub const SUMMER: &str = "SS";
    pub const ALL: &[&str] = &[WINTER, SUMMER];
}

pub mod course_types {
    pub const ALL: &[&str] = &["VL", "UE", "VU", "PR", "SE"];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub course_code: String,
    pub title: String,
    pub ects: f64,
    pub semester: String,
    pub faculty: String,
    pub course_type: String,
    pub language: String,
    /// JSON array of prerequisite course codes.
    pub prerequisites: Option<String>,
    pub is_steop_required: bool,
    pub is_steop_allowed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Course as returned by the API, with prerequisites expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub id: String,
    pub course_code: String,
    pub title: String,
    pub ects: f64,
    pub semester: String,
    pub faculty: String,
    pub course_type: String,
    pub language: String,
    pub prerequisites: Vec<String>,
    pub is_steop_required: bool,
    pub is_steop_allowed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Course {
    pub fn to_response(&self) -> CourseResponse {
        let prerequisites = self
            .prerequisites
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        CourseResponse {
            id: self.id.clone(),
            course_code: self.course_code.clone(),
            title: self.title.clone(),
            ects: self.ects,
            semester: self.semester.clone(),
            faculty: self.faculty.clone(),
            course_type: self.course_type.clone(),
            language: self.language.clone(),
            prerequisites,
            is_steop_required: self.is_steop_required,
            is_steop_allowed: self.is_steop_allowed,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub course_code: String,
    pub title: String,
    pub ects: f64,
    pub semester: String,
    pub faculty: String,
    pub course_type: String,
    pub language: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    /// STEOP flags are derived from the course code when not supplied.
    pub is_steop_required: Option<bool>,
    pub is_steop_allowed: Option<bool>,
}

/// Catalog listing filters, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct CourseFilter {
    pub search: Option<String>,
    pub faculty: Option<String>,
    pub semester: Option<String>,
    pub course_type: Option<String>,
}
