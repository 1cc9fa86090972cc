//! Full workout view: exercises in order, their sets, volume, and the
//! previous-performance comparison under the configured policy.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::models::{Exercise, Workout, WorkoutExercise, WorkoutSet};
use crate::db::operations::{
    get_all_exercises, get_previous_performance_policy, get_workout, sets_for_workout_exercise,
    workout_exercises_for,
};
use crate::live::{Table, TableSet};
use crate::views::previous::{PreviousPerformance, previous_performance};

pub const WORKOUT_DETAIL_TABLES: TableSet = TableSet::of(&[
    Table::Workouts,
    Table::WorkoutExercises,
    Table::Sets,
    Table::Exercises,
    Table::Settings,
]);

#[derive(Serialize, Debug, Clone)]
pub struct ExerciseDetail {
    pub workout_exercise: WorkoutExercise,
    pub exercise: Exercise,
    pub sets: Vec<WorkoutSet>,
    /// Completed-set volume for this exercise alone.
    pub total_volume: f64,
    pub previous: Option<PreviousPerformance>,
}

#[derive(Serialize, Debug, Clone)]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub exercises: Vec<ExerciseDetail>,
    pub total_volume: f64,
}

pub async fn workout_detail(pool: &SqlitePool, workout_id: i64) -> Result<Option<WorkoutDetail>> {
    let Some(workout) = get_workout(pool, workout_id).await? else {
        return Ok(None);
    };
    let policy = get_previous_performance_policy(pool).await?;

    let exercise_map: HashMap<i64, Exercise> = get_all_exercises(pool)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

    let mut exercises = Vec::new();
    let mut total_volume = 0.0;
    for we in workout_exercises_for(pool, workout_id).await? {
        // An exercise deleted from the library leaves this entry dangling;
        // it is simply not part of the view.
        let Some(exercise) = exercise_map.get(&we.exercise_id) else {
            continue;
        };

        let sets = sets_for_workout_exercise(pool, we.id).await?;
        let volume: f64 = sets.iter().filter(|s| s.completed).map(|s| s.volume()).sum();
        let previous = previous_performance(pool, &workout, we.exercise_id, policy).await?;

        total_volume += volume;
        exercises.push(ExerciseDetail {
            workout_exercise: we,
            exercise: exercise.clone(),
            sets,
            total_volume: volume,
            previous,
        });
    }

    Ok(Some(WorkoutDetail {
        workout,
        exercises,
        total_volume,
    }))
}
