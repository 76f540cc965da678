//! Input validation for API requests.
//!
//! Validation functions for request data; collect multiple errors with the
//! `ValidationErrorBuilder` from the `error` module.

use chrono::DateTime;
use lazy_static::lazy_static;
use regex::Regex;

use crate::db::{course_types, semester_types, status};

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    /// Regex for validating course codes (e.g. VL.ALGEBRA, UE.PROGRAMMIERUNG.1)
    static ref COURSE_CODE_REGEX: Regex = Regex::new(
        r"^[A-Z]{2}(\.[A-Z0-9]+)+$"
    ).unwrap();

    /// Regex for validating hex colors (e.g. #3b82f6)
    static ref COLOR_REGEX: Regex = Regex::new(
        r"^#[0-9a-fA-F]{6}$"
    ).unwrap();

    /// Regex for validating UUIDs
    static ref UUID_REGEX: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    ).unwrap();
}

/// Validate a UUID path/request parameter
pub fn validate_uuid(id: &str, field: &str) -> Result<(), String> {
    if !UUID_REGEX.is_match(id) {
        return Err(format!("{field} must be a valid UUID"));
    }
    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    Ok(())
}

/// Validate a catalog course code
pub fn validate_course_code(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("Course code is required".to_string());
    }
    if code.len() > 64 {
        return Err("Course code is too long (max 64 characters)".to_string());
    }
    if !COURSE_CODE_REGEX.is_match(code) {
        return Err(
            "Course code must be uppercase dot-separated segments (e.g. VL.ALGEBRA)".to_string(),
        );
    }
    Ok(())
}

/// Validate an enrollment status value
pub fn validate_status(value: &str) -> Result<(), String> {
    if status::ALL.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Status must be one of: {}",
            status::ALL.join(", ")
        ))
    }
}

/// Validate a grade on the Austrian 1.0-5.0 scale
pub fn validate_grade(grade: f64) -> Result<(), String> {
    if !(1.0..=5.0).contains(&grade) {
        return Err("Grade must be between 1.0 and 5.0".to_string());
    }
    Ok(())
}

/// Validate an ECTS value
pub fn validate_ects(ects: f64) -> Result<(), String> {
    if !(0.0..=60.0).contains(&ects) {
        return Err("ECTS must be between 0 and 60".to_string());
    }
    Ok(())
}

/// Validate a semester type (WS/SS)
pub fn validate_semester_type(value: &str) -> Result<(), String> {
    if semester_types::ALL.contains(&value) {
        Ok(())
    } else {
        Err("Semester type must be WS or SS".to_string())
    }
}

/// Validate a course type (VL/UE/VU/PR/SE)
pub fn validate_course_type(value: &str) -> Result<(), String> {
    if course_types::ALL.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Course type must be one of: {}",
            course_types::ALL.join(", ")
        ))
    }
}

/// Validate a semester year
pub fn validate_year(year: i64) -> Result<(), String> {
    if !(1990..=2100).contains(&year) {
        return Err("Year must be between 1990 and 2100".to_string());
    }
    Ok(())
}

/// Validate a hex color value
pub fn validate_color(color: &str) -> Result<(), String> {
    if !COLOR_REGEX.is_match(color) {
        return Err("Color must be a hex value like #3b82f6".to_string());
    }
    Ok(())
}

/// Validate an RFC 3339 timestamp
pub fn validate_timestamp(value: &str, field: &str) -> Result<(), String> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| format!("{field} must be an RFC 3339 timestamp"))
}

/// Validate that an activity time range is well-formed and non-negative
pub fn validate_time_range(start: &str, end: &str) -> Result<(), String> {
    let start = DateTime::parse_from_rfc3339(start)
        .map_err(|_| "start_time must be an RFC 3339 timestamp".to_string())?;
    let end = DateTime::parse_from_rfc3339(end)
        .map_err(|_| "end_time must be an RFC 3339 timestamp".to_string())?;
    if end < start {
        return Err("end_time must not be before start_time".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("student@uni.ac.at").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_validate_course_code() {
        assert!(validate_course_code("VL.ALGEBRA").is_ok());
        assert!(validate_course_code("UE.PROGRAMMIERUNG.1").is_ok());
        assert!(validate_course_code("").is_err());
        assert!(validate_course_code("algebra").is_err());
        assert!(validate_course_code("VL").is_err());
    }

    #[test]
    fn test_validate_status() {
        assert!(validate_status("planned").is_ok());
        assert!(validate_status("completed").is_ok());
        assert!(validate_status("dropped").is_err());
    }

    #[test]
    fn test_validate_grade_bounds() {
        assert!(validate_grade(1.0).is_ok());
        assert!(validate_grade(5.0).is_ok());
        assert!(validate_grade(0.9).is_err());
        assert!(validate_grade(5.1).is_err());
    }

    #[test]
    fn test_validate_time_range() {
        assert!(validate_time_range(
            "2024-07-15T08:00:00+00:00",
            "2024-07-15T10:00:00+00:00"
        )
        .is_ok());
        // zero-length activities are allowed
        assert!(validate_time_range(
            "2024-07-15T08:00:00+00:00",
            "2024-07-15T08:00:00+00:00"
        )
        .is_ok());
        assert!(validate_time_range(
            "2024-07-15T10:00:00+00:00",
            "2024-07-15T08:00:00+00:00"
        )
        .is_err());
        assert!(validate_time_range("yesterday", "2024-07-15T08:00:00+00:00").is_err());
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#3b82f6").is_ok());
        assert!(validate_color("#FFFFFF").is_ok());
        assert!(validate_color("blue").is_err());
        assert!(validate_color("#fff").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
        assert!(validate_uuid("not-a-uuid", "id").is_err());
    }
}
