//! Per-exercise training history over a date window.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::WorkoutSet;
use crate::db::operations::exercise_set_history;
use crate::live::{Table, TableSet};

pub const EXERCISE_HISTORY_TABLES: TableSet =
    TableSet::of(&[Table::Workouts, Table::WorkoutExercises, Table::Sets]);

/// One workout's worth of completed sets for the exercise, newest first in
/// the returned list.
#[derive(Serialize, Debug, Clone)]
pub struct HistoryEntry {
    pub workout_id: i64,
    pub date: String,
    pub sets: Vec<WorkoutSet>,
    pub total_volume: f64,
    pub max_weight: f64,
}

pub async fn exercise_history(
    pool: &SqlitePool,
    exercise_id: i64,
    from: &str,
    to: &str,
) -> Result<Vec<HistoryEntry>> {
    let rows = exercise_set_history(pool, exercise_id).await?;

    let mut entries: Vec<HistoryEntry> = Vec::new();
    for row in rows {
        if row.date.as_str() < from || row.date.as_str() > to {
            continue;
        }
        let set = row.set();
        match entries.last_mut() {
            Some(entry) if entry.workout_id == row.workout_id => {
                entry.total_volume += set.volume();
                entry.max_weight = entry.max_weight.max(set.weight);
                entry.sets.push(set);
            }
            _ => entries.push(HistoryEntry {
                workout_id: row.workout_id,
                date: row.date,
                total_volume: set.volume(),
                max_weight: set.weight,
                sets: vec![set],
            }),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::views::testsupport::completed_workout;

    const EXERCISE: i64 = 1;

    #[tokio::test]
    async fn groups_sets_per_workout_newest_first() {
        let pool = test_pool().await;
        completed_workout(
            &pool,
            None,
            "2025-03-01",
            1_000_000,
            &[(EXERCISE, &[(100.0, 5, true), (90.0, 8, true)])],
        )
        .await;
        completed_workout(
            &pool,
            None,
            "2025-03-04",
            2_000_000,
            &[(EXERCISE, &[(105.0, 3, true), (80.0, 10, false)])],
        )
        .await;

        let history = exercise_history(&pool, EXERCISE, "2025-03-01", "2025-03-31")
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2025-03-04");
        assert_eq!(history[0].total_volume, 315.0);
        assert_eq!(history[0].max_weight, 105.0);
        assert_eq!(history[0].sets.len(), 1);

        assert_eq!(history[1].date, "2025-03-01");
        assert_eq!(history[1].total_volume, 500.0 + 720.0);
        assert_eq!(history[1].max_weight, 100.0);
    }

    #[tokio::test]
    async fn window_bounds_are_inclusive() {
        let pool = test_pool().await;
        completed_workout(
            &pool,
            None,
            "2025-02-28",
            500_000,
            &[(EXERCISE, &[(60.0, 10, true)])],
        )
        .await;
        completed_workout(
            &pool,
            None,
            "2025-03-01",
            1_000_000,
            &[(EXERCISE, &[(60.0, 10, true)])],
        )
        .await;

        let history = exercise_history(&pool, EXERCISE, "2025-03-01", "2025-03-01")
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, "2025-03-01");
    }
}
