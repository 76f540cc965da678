//! Calendar day-grid generation for month and week views.
//!
//! Pure date arithmetic: given a reference date and a view mode, produce the
//! ordered list of days to render and assign activities to them. Weeks start
//! on Monday in both views.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::Activity;

/// Calendar view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Month,
    Week,
}

/// A single rendered day with the activities that fall on it.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// First and last day of the month containing `date`.
fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first + Months::new(1) - Days::new(1);
    (first, last)
}

/// Generate the ordered day sequence for a view.
///
/// Week view yields exactly the 7 days of the Monday-started week containing
/// the reference date. Month view yields the whole reference month padded to
/// full weeks on both ends, so the length is always a multiple of 7.
pub fn day_grid(reference: NaiveDate, view: CalendarView) -> Vec<NaiveDate> {
    let (start, end) = match view {
        CalendarView::Week => {
            let start = week_start(reference);
            (start, start + Days::new(6))
        }
        CalendarView::Month => {
            let (first, last) = month_bounds(reference);
            let end = last + Days::new(u64::from(6 - last.weekday().num_days_from_monday()));
            (week_start(first), end)
        }
    };

    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Assign activities to grid days by the date component of their start time.
///
/// Matching is exact on `YYYY-MM-DD`; activities whose start date falls
/// outside the grid simply do not appear.
pub fn assign_activities(days: &[NaiveDate], activities: &[Activity]) -> Vec<CalendarDay> {
    days.iter()
        .map(|&date| {
            let key = date.format("%Y-%m-%d").to_string();
            CalendarDay {
                date,
                activities: activities
                    .iter()
                    .filter(|a| a.start_time.get(..10) == Some(key.as_str()))
                    .cloned()
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn activity(start_time: &str) -> Activity {
        Activity {
            id: "a".to_string(),
            user_id: "u".to_string(),
            title: "Study session".to_string(),
            description: None,
            start_time: start_time.to_string(),
            end_time: start_time.to_string(),
            activity_type: "study".to_string(),
            color: "#3b82f6".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_week_grid_is_seven_consecutive_days() {
        // 2024-07-18 is a Thursday
        let grid = day_grid(date(2024, 7, 18), CalendarView::Week);
        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0], date(2024, 7, 15));
        assert_eq!(grid[0].weekday(), Weekday::Mon);
        for pair in grid.windows(2) {
            assert_eq!(pair[1] - pair[0], chrono::Duration::days(1));
        }
    }

    #[test]
    fn test_week_grid_when_reference_is_monday() {
        let grid = day_grid(date(2024, 7, 15), CalendarView::Week);
        assert_eq!(grid[0], date(2024, 7, 15));
        assert_eq!(grid[6], date(2024, 7, 21));
    }

    #[test]
    fn test_month_grid_covers_month_and_is_weeks() {
        let reference = date(2024, 2, 10);
        let grid = day_grid(reference, CalendarView::Month);
        assert_eq!(grid.len() % 7, 0);
        assert_eq!(grid[0].weekday(), Weekday::Mon);
        assert_eq!(grid.last().unwrap().weekday(), Weekday::Sun);
        // every day of February 2024 (leap year) is present
        for day in 1..=29 {
            assert!(grid.contains(&date(2024, 2, day)));
        }
    }

    #[test]
    fn test_month_grid_pads_both_ends() {
        // June 2024 starts on a Saturday and ends on a Sunday
        let grid = day_grid(date(2024, 6, 1), CalendarView::Month);
        assert_eq!(grid[0], date(2024, 5, 27));
        assert_eq!(*grid.last().unwrap(), date(2024, 6, 30));
        assert_eq!(grid.len(), 35);
    }

    #[test]
    fn test_december_month_grid_crosses_year() {
        let grid = day_grid(date(2023, 12, 15), CalendarView::Month);
        assert!(grid.contains(&date(2023, 12, 31)));
        assert_eq!(grid.len() % 7, 0);
    }

    #[test]
    fn test_grid_is_idempotent() {
        let a = day_grid(date(2025, 3, 3), CalendarView::Month);
        let b = day_grid(date(2025, 3, 3), CalendarView::Month);
        assert_eq!(a, b);
    }

    #[test]
    fn test_assign_activities_by_start_date() {
        let days = day_grid(date(2024, 7, 18), CalendarView::Week);
        let activities = vec![
            activity("2024-07-15T08:00:00+00:00"),
            activity("2024-07-15T14:00:00+00:00"),
            activity("2024-07-19T09:30:00+00:00"),
            // outside the grid, must be invisible
            activity("2024-08-01T10:00:00+00:00"),
        ];
        let assigned = assign_activities(&days, &activities);
        assert_eq!(assigned.len(), 7);
        assert_eq!(assigned[0].activities.len(), 2);
        assert_eq!(assigned[4].activities.len(), 1);
        let total: usize = assigned.iter().map(|d| d.activities.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_assign_activities_ignores_malformed_timestamps() {
        let days = day_grid(date(2024, 7, 18), CalendarView::Week);
        let assigned = assign_activities(&days, &[activity("bad")]);
        let total: usize = assigned.iter().map(|d| d.activities.len()).sum();
        assert_eq!(total, 0);
    }
}
