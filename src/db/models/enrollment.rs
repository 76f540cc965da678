//! Enrollment (user-course) models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub mod status {
    pub const PLANNED: &str = "planned";
    pub const ENROLLED: &str = "enrolled";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const ALL: &[&str] = &[PLANNED, ENROLLED, COMPLETED, FAILED];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub status: String,
    pub grade: Option<f64>,
    /// ECTS override; the catalog value applies when absent.
    pub ects: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Enrollment joined with the catalog fields needed for display and for the
/// ECTS fallback in progress statistics.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EnrollmentWithCourse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub status: String,
    pub grade: Option<f64>,
    pub ects: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
    pub course_code: String,
    pub course_title: String,
    pub course_ects: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub course_id: String,
    pub status: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub status: Option<String>,
    pub grade: Option<f64>,
    pub ects: Option<f64>,
}
