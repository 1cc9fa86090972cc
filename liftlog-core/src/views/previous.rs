//! Previous-performance selection.
//!
//! Four policies pick the comparison workout for an exercise: restrict to
//! the same routine or search all routines, then take either the most
//! recent qualifying workout or the one whose completed volume for the
//! exercise was highest. No qualifying prior data simply means no
//! comparison.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::{ExerciseSetRow, PreviousPerformancePolicy, Workout, WorkoutSet};
use crate::db::operations::exercise_set_history;
use crate::live::{Table, TableSet};

pub const PREVIOUS_PERFORMANCE_TABLES: TableSet = TableSet::of(&[
    Table::Workouts,
    Table::WorkoutExercises,
    Table::Sets,
    Table::Settings,
]);

#[derive(Serialize, Debug, Clone)]
pub struct PreviousPerformance {
    pub workout_id: i64,
    pub date: String,
    pub sets: Vec<WorkoutSet>,
    pub total_volume: f64,
}

pub async fn previous_performance(
    pool: &SqlitePool,
    current: &Workout,
    exercise_id: i64,
    policy: PreviousPerformancePolicy,
) -> Result<Option<PreviousPerformance>> {
    let rows = exercise_set_history(pool, exercise_id).await?;
    Ok(select_previous(&rows, current, policy))
}

/// Pure selection over the exercise's completed-set history (rows ordered
/// newest workout first, sets in workout order).
pub(crate) fn select_previous(
    rows: &[ExerciseSetRow],
    current: &Workout,
    policy: PreviousPerformancePolicy,
) -> Option<PreviousPerformance> {
    let routine_scope = if policy.same_routine_only() {
        // A workout without a routine has no routine-scoped history.
        Some(current.routine_id?)
    } else {
        None
    };

    let mut candidates: Vec<PreviousPerformance> = Vec::new();
    for row in rows {
        if row.workout_id == current.id {
            continue;
        }
        if (row.date.as_str(), row.start_time) >= (current.date.as_str(), current.start_time) {
            continue;
        }
        if let Some(routine_id) = routine_scope {
            if row.routine_id != Some(routine_id) {
                continue;
            }
        }

        let set = row.set();
        match candidates.last_mut() {
            Some(group) if group.workout_id == row.workout_id => {
                group.total_volume += set.volume();
                group.sets.push(set);
            }
            _ => candidates.push(PreviousPerformance {
                workout_id: row.workout_id,
                date: row.date.clone(),
                total_volume: set.volume(),
                sets: vec![set],
            }),
        }
    }

    if policy.picks_best() {
        // Strictly-greater keeps the more recent instance on ties.
        candidates
            .into_iter()
            .reduce(|best, next| {
                if next.total_volume > best.total_volume {
                    next
                } else {
                    best
                }
            })
    } else {
        candidates.into_iter().next()
    }
}
