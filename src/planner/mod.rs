//! Study-planning domain logic.
//!
//! Pure computations over catalog and enrollment data: progress statistics,
//! STEOP classification of course codes, and calendar day-grid generation.
//! Nothing in here touches the database or the HTTP layer.

pub mod calendar;
pub mod stats;
pub mod steop;
