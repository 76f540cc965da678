//! Calendar view endpoint: month/week day grids with assigned activities.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::User;
use crate::planner::calendar::{assign_activities, day_grid, CalendarDay, CalendarView};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// Reference date (YYYY-MM-DD); defaults to today.
    pub date: Option<String>,
    pub view: Option<CalendarView>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub reference: NaiveDate,
    pub view: CalendarView,
    pub days: Vec<CalendarDay>,
}

/// Render the authenticated user's calendar grid for a month or week view.
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    user: User,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, ApiError> {
    let reference = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::validation_field("date", "Date must be YYYY-MM-DD"))?,
        None => chrono::Utc::now().date_naive(),
    };
    let view = query.view.unwrap_or(CalendarView::Month);

    let days = day_grid(reference, view);

    // Only fetch activities inside the grid range (end bound is exclusive
    // on the day after the grid)
    let first = days.first().map(|d| d.to_string()).unwrap_or_default();
    let after_last = days
        .last()
        .map(|d| (*d + chrono::Days::new(1)).to_string())
        .unwrap_or_default();

    let activities = sqlx::query_as::<_, crate::db::Activity>(
        "SELECT * FROM activities WHERE user_id = ? AND start_time >= ? AND start_time < ? ORDER BY start_time",
    )
    .bind(&user.id)
    .bind(&first)
    .bind(&after_last)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CalendarResponse {
        reference,
        view,
        days: assign_activities(&days, &activities),
    }))
}
