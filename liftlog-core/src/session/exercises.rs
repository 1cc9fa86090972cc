//! Exercise library management on top of the seeded catalog.

use anyhow::Result;

use crate::db::models::{Exercise, NewExercise};
use crate::db::operations::{
    create_exercise, delete_exercise_cascade, get_all_exercises, get_exercise,
    get_exercises_by_muscle_group, search_exercises, update_exercise,
};
use crate::live::{Table, TableSet};
use crate::session::Session;

impl Session {
    pub async fn create_custom_exercise(&self, new: &NewExercise) -> Result<Exercise> {
        let exercise = create_exercise(
            &self.db_pool,
            &NewExercise {
                is_custom: true,
                ..new.clone()
            },
        )
        .await?;
        self.bus.publish(TableSet::of(&[Table::Exercises]));
        Ok(exercise)
    }

    pub async fn get_exercise(&self, exercise_id: i64) -> Result<Option<Exercise>> {
        get_exercise(&self.db_pool, exercise_id).await
    }

    pub async fn all_exercises(&self) -> Result<Vec<Exercise>> {
        get_all_exercises(&self.db_pool).await
    }

    pub async fn exercises_by_muscle_group(&self, muscle_group: &str) -> Result<Vec<Exercise>> {
        get_exercises_by_muscle_group(&self.db_pool, muscle_group).await
    }

    pub async fn search_exercises(&self, term: &str) -> Result<Vec<Exercise>> {
        search_exercises(&self.db_pool, term).await
    }

    pub async fn update_exercise(&self, exercise_id: i64, new: &NewExercise) -> Result<Exercise> {
        let exercise = update_exercise(&self.db_pool, exercise_id, new).await?;
        self.bus.publish(TableSet::of(&[Table::Exercises]));
        Ok(exercise)
    }

    /// Delete an exercise and its routine entries. History rows referencing
    /// it stay put; the read side filters them as orphans.
    pub async fn delete_exercise(&self, exercise_id: i64) -> Result<u64> {
        let deleted = delete_exercise_cascade(&self.db_pool, exercise_id).await?;
        #[cfg(debug_assertions)]
        self.diagnostics
            .cascade_deletes
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.bus
            .publish(TableSet::of(&[Table::Exercises, Table::RoutineExercises]));
        Ok(deleted)
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
    async fn custom_exercises_are_flagged_custom() {
        let session = test_session().await;
        let exercise = session
            .create_custom_exercise(&NewExercise {
                name: "Zercher Squat".to_string(),
                muscle_group: "Quads".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(exercise.is_custom);
    }

    #[tokio::test]
    async fn search_matches_names_and_aliases() {
        let session = test_session().await;
        let by_name = session.search_exercises("Romanian").await.unwrap();
        assert!(by_name.iter().any(|e| e.name == "Romanian Deadlift"));

        let by_alias = session.search_exercises("RDL").await.unwrap();
        assert!(by_alias.iter().any(|e| e.name == "Romanian Deadlift"));
    }

    #[tokio::test]
    async fn deleting_an_exercise_prunes_routine_entries() {
        let session = test_session().await;
        let exercise = session
            .create_custom_exercise(&NewExercise {
                name: "Pendlay Row".to_string(),
                muscle_group: "Back".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let routine = session.create_routine("Pull", None).await.unwrap();
        session
            .add_exercise_to_routine(routine.id, exercise.id, 3, 8)
            .await
            .unwrap();

        session.delete_exercise(exercise.id).await.unwrap();

        assert!(session.get_exercise(exercise.id).await.unwrap().is_none());
        assert!(session.routine_exercises(routine.id).await.unwrap().is_empty());
    }
}
