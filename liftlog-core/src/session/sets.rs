//! Set logging inside a workout.

use anyhow::Result;

use crate::db::models::{UpdateWorkoutSet, WorkoutExercise, WorkoutSet};
use crate::db::operations::{
    add_set, add_workout_exercise, delete_set, sets_for_workout_exercise, update_set,
    workout_exercises_for,
};
use crate::live::{Table, TableSet};
use crate::session::Session;

impl Session {
    /// Add an exercise to an in-flight workout (ad hoc, outside the routine
    /// template), appended after the existing ones.
    pub async fn add_exercise_to_workout(
        &self,
        workout_id: i64,
        exercise_id: i64,
    ) -> Result<WorkoutExercise> {
        let position = workout_exercises_for(&self.db_pool, workout_id).await?.len() as i64;
        let we = add_workout_exercise(&self.db_pool, workout_id, exercise_id, position).await?;
        self.bus.publish(TableSet::of(&[Table::WorkoutExercises]));
        Ok(we)
    }

    pub async fn add_set(
        &self,
        workout_exercise_id: i64,
        weight: f64,
        reps: i64,
        completed: bool,
        rir: Option<i64>,
    ) -> Result<WorkoutSet> {
        let set = add_set(&self.db_pool, workout_exercise_id, weight, reps, completed, rir).await?;
        self.bus.publish(TableSet::of(&[Table::Sets]));
        Ok(set)
    }

    pub async fn update_set(&self, set_id: i64, update: &UpdateWorkoutSet) -> Result<WorkoutSet> {
        let set = update_set(&self.db_pool, set_id, update).await?;
        self.bus.publish(TableSet::of(&[Table::Sets]));
        Ok(set)
    }

    pub async fn delete_set(&self, set_id: i64) -> Result<u64> {
        let deleted = delete_set(&self.db_pool, set_id).await?;
        self.bus.publish(TableSet::of(&[Table::Sets]));
        Ok(deleted)
    }

    pub async fn sets_for_exercise(&self, workout_exercise_id: i64) -> Result<Vec<WorkoutSet>> {
        sets_for_workout_exercise(&self.db_pool, workout_exercise_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::session::SessionConfig;

    async fn test_session() -> Session {
        Session::from_pool(test_pool().await, SessionConfig::default())
            .await
            .expect("session")
    }

    #[tokio::test]
    async fn ad_hoc_exercise_lands_after_existing_ones() {
        let session = test_session().await;
        let workout = session.start_blank_workout().await.unwrap();
        let first = session
            .add_exercise_to_workout(workout.id, 1)
            .await
            .unwrap();
        let second = session
            .add_exercise_to_workout(workout.id, 2)
            .await
            .unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
    }

    #[tokio::test]
    async fn set_update_merges_with_stored_values() {
        let session = test_session().await;
        let workout = session.start_blank_workout().await.unwrap();
        let we = session
            .add_exercise_to_workout(workout.id, 1)
            .await
            .unwrap();
        let set = session.add_set(we.id, 60.0, 8, false, Some(2)).await.unwrap();

        let updated = session
            .update_set(
                set.id,
                &UpdateWorkoutSet {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.completed);
        assert_eq!(updated.weight, 60.0);
        assert_eq!(updated.reps, 8);
        assert_eq!(updated.rir, Some(2));

        let cleared = session
            .update_set(
                set.id,
                &UpdateWorkoutSet {
                    rir: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.rir, None);
    }
}
