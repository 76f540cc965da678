//! Academic progress statistics.
//!
//! Aggregates a user's full enrollment list into the summary shown on the
//! dashboard: counts per status, total ECTS earned, and current GPA.

use serde::{Deserialize, Serialize};

use crate::db::{status, EnrollmentWithCourse};

/// Summary statistics derived from a user's enrollment ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentStats {
    pub total_courses: usize,
    pub completed_courses: usize,
    pub enrolled_courses: usize,
    pub planned_courses: usize,
    pub total_ects: f64,
    pub current_gpa: f64,
}

/// Compute summary statistics over a user's enrollments.
///
/// Failed enrollments count toward the total only. ECTS are summed over
/// completed enrollments, preferring the per-enrollment override and falling
/// back to the catalog value. The GPA is the mean grade over completed
/// enrollments that carry a grade, rounded to two decimals, or 0.0 when no
/// graded enrollment exists. An empty list yields all zeros.
pub fn summarize(enrollments: &[EnrollmentWithCourse]) -> EnrollmentStats {
    let mut stats = EnrollmentStats {
        total_courses: enrollments.len(),
        ..Default::default()
    };

    let mut grade_sum = 0.0;
    let mut graded = 0usize;

    for enrollment in enrollments {
        match enrollment.status.as_str() {
            status::COMPLETED => {
                stats.completed_courses += 1;
                stats.total_ects += enrollment.ects.unwrap_or(enrollment.course_ects);
                if let Some(grade) = enrollment.grade {
                    grade_sum += grade;
                    graded += 1;
                }
            }
            status::ENROLLED => stats.enrolled_courses += 1,
            status::PLANNED => stats.planned_courses += 1,
            _ => {}
        }
    }

    if graded > 0 {
        stats.current_gpa = round2(grade_sum / graded as f64);
    }

    stats
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
