//! Training streaks over calendar days.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

use crate::db::operations::all_completed_workouts;
use crate::live::{Table, TableSet};

pub const STREAK_TABLES: TableSet = TableSet::of(&[Table::Workouts]);

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streaks {
    /// Consecutive days with a completed workout, counted backward from
    /// `today`.
    pub current: u32,
    /// Longest run of calendar-adjacent training days on record.
    pub longest: u32,
}

/// `today` is a parameter rather than read from the clock so the boundary
/// behavior is testable.
pub async fn workout_streaks(pool: &SqlitePool, today: NaiveDate) -> Result<Streaks> {
    let dates: BTreeSet<NaiveDate> = all_completed_workouts(pool)
        .await?
        .into_iter()
        .filter_map(|w| NaiveDate::parse_from_str(&w.date, "%Y-%m-%d").ok())
        .collect();
    Ok(compute_streaks(&dates, today))
}

pub(crate) fn compute_streaks(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> Streaks {
    let mut current = 0u32;
    let mut day = today;
    while dates.contains(&day) {
        current += 1;
        let Some(previous) = day.checked_sub_days(Days::new(1)) else {
            break;
        };
        day = previous;
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut last: Option<NaiveDate> = None;
    for &date in dates {
        run = match last {
            Some(previous) if previous.checked_add_days(Days::new(1)) == Some(date) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        last = Some(date);
    }

    Streaks { current, longest }
}
