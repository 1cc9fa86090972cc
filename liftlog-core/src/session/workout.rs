//! Workout lifecycle: start, complete, delete, drift reconciliation, and
//! garbage collection of abandoned sessions.

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::models::Workout;
use crate::db::operations::{
    add_placeholder_sets, add_workout_exercise, bulk_update_target_sets,
    complete_workout, completed_set_counts_for_workout, create_workout, delete_workout_cascade,
    get_in_progress_workout, get_routine, get_workout, routine_exercises_for,
    stale_in_progress_workouts,
};
use crate::live::{Table, TableSet};
use crate::session::Session;

const WORKOUT_TREE: TableSet =
    TableSet::of(&[Table::Workouts, Table::WorkoutExercises, Table::Sets]);

/// One exercise whose performed completed-set count differs from the
/// routine's stored target.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoutineDrift {
    pub routine_exercise_id: i64,
    pub exercise_id: i64,
    pub target_sets: i64,
    pub performed_sets: i64,
}

impl Session {
    /// Start an empty workout. Any workout still in progress is discarded
    /// first (with its exercises and sets), so at most one in-progress
    /// workout ever exists.
    pub async fn start_blank_workout(&self) -> Result<Workout> {
        self.collect_stale_workouts().await?;
        self.discard_in_progress().await?;

        let workout = create_workout(&self.db_pool, None, &self.today(), self.now()).await?;
        self.bus.publish(WORKOUT_TREE);
        Ok(workout)
    }

    /// Start a workout from a routine template: one workout exercise per
    /// routine entry, in template order, each with `target_sets` empty
    /// placeholder sets.
    pub async fn start_workout_from_routine(&self, routine_id: i64) -> Result<Workout> {
        let routine = get_routine(&self.db_pool, routine_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("routine {routine_id} not found"))?;

        self.collect_stale_workouts().await?;
        self.discard_in_progress().await?;

        let workout =
            create_workout(&self.db_pool, Some(routine.id), &self.today(), self.now()).await?;
        for entry in routine_exercises_for(&self.db_pool, routine.id).await? {
            let we = add_workout_exercise(
                &self.db_pool,
                workout.id,
                entry.exercise_id,
                entry.position,
            )
            .await?;
            add_placeholder_sets(&self.db_pool, we.id, entry.target_sets).await?;
        }

        self.bus.publish(WORKOUT_TREE);
        Ok(workout)
    }

    pub async fn active_workout(&self) -> Result<Option<Workout>> {
        get_in_progress_workout(&self.db_pool).await
    }

    /// Stamp the end time. Set completeness is not validated; what the user
    /// logged is what stands.
    pub async fn complete_workout(&self, workout_id: i64) -> Result<Workout> {
        let workout = complete_workout(&self.db_pool, workout_id, self.now()).await?;
        self.bus.publish(TableSet::of(&[Table::Workouts]));
        Ok(workout)
    }

    pub async fn delete_workout(&self, workout_id: i64) -> Result<u64> {
        let deleted = delete_workout_cascade(&self.db_pool, workout_id).await?;
        #[cfg(debug_assertions)]
        self.diagnostics
            .cascade_deletes
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.bus.publish(WORKOUT_TREE);
        Ok(deleted)
    }

    /// Compare a completed workout's performed set counts against its
    /// routine's targets. Empty when the workout was not started from a
    /// routine or nothing drifted.
    pub async fn routine_drift(&self, workout_id: i64) -> Result<Vec<RoutineDrift>> {
        let workout = get_workout(&self.db_pool, workout_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("workout {workout_id} not found"))?;
        let Some(routine_id) = workout.routine_id else {
            return Ok(Vec::new());
        };

        let performed: HashMap<i64, i64> =
            completed_set_counts_for_workout(&self.db_pool, workout_id)
                .await?
                .into_iter()
                .collect();

        let mut drift = Vec::new();
        for entry in routine_exercises_for(&self.db_pool, routine_id).await? {
            let Some(&performed_sets) = performed.get(&entry.exercise_id) else {
                continue;
            };
            if performed_sets != entry.target_sets {
                drift.push(RoutineDrift {
                    routine_exercise_id: entry.id,
                    exercise_id: entry.exercise_id,
                    target_sets: entry.target_sets,
                    performed_sets,
                });
            }
        }
        Ok(drift)
    }

    /// Apply a user-confirmed drift reconciliation: each listed routine
    /// entry's target becomes the performed set count.
    pub async fn apply_routine_drift(&self, drift: &[RoutineDrift]) -> Result<()> {
        if drift.is_empty() {
            return Ok(());
        }
        let changes: Vec<(i64, i64)> = drift
            .iter()
            .map(|d| (d.routine_exercise_id, d.performed_sets))
            .collect();
        bulk_update_target_sets(&self.db_pool, &changes).await?;
        self.bus.publish(TableSet::of(&[Table::RoutineExercises]));
        Ok(())
    }

    /// Delete in-progress workouts older than the retention window. Runs on
    /// session open and before each workout start; not a scheduled job.
    pub async fn collect_stale_workouts(&self) -> Result<u64> {
        let cutoff = self.now() - self.config.abandoned_retention_days * 86_400;
        let stale = stale_in_progress_workouts(&self.db_pool, cutoff).await?;
        if stale.is_empty() {
            return Ok(0);
        }

        let mut collected = 0u64;
        for workout in stale {
            collected += delete_workout_cascade(&self.db_pool, workout.id).await?;
        }
        info!("collected {collected} abandoned workouts");
        #[cfg(debug_assertions)]
        self.diagnostics
            .stale_workouts_collected
            .fetch_add(collected, std::sync::atomic::Ordering::Relaxed);
        self.bus.publish(WORKOUT_TREE);
        Ok(collected)
    }

    async fn discard_in_progress(&self) -> Result<()> {
        while let Some(existing) = get_in_progress_workout(&self.db_pool).await? {
            info!("discarding in-progress workout {}", existing.id);
            delete_workout_cascade(&self.db_pool, existing.id).await?;
        }
        Ok(())
    }
}
