//! Routine template management.

use anyhow::Result;

use crate::db::models::{Routine, RoutineExercise};
use crate::db::operations::{
    add_routine_exercise, create_routine, delete_routine_cascade, get_all_routines, get_routine,
    remove_routine_exercise, reorder_routine_exercises, routine_exercises_for, update_routine,
    update_routine_targets,
};
use crate::live::{Table, TableSet};
use crate::session::Session;

impl Session {
    pub async fn create_routine(&self, name: &str, notes: Option<&str>) -> Result<Routine> {
        let routine = create_routine(&self.db_pool, name, notes, self.now()).await?;
        self.bus.publish(TableSet::of(&[Table::Routines]));
        Ok(routine)
    }

    pub async fn get_routine(&self, routine_id: i64) -> Result<Option<Routine>> {
        get_routine(&self.db_pool, routine_id).await
    }

    pub async fn all_routines(&self) -> Result<Vec<Routine>> {
        get_all_routines(&self.db_pool).await
    }

    pub async fn update_routine(
        &self,
        routine_id: i64,
        name: &str,
        notes: Option<&str>,
    ) -> Result<Routine> {
        let routine = update_routine(&self.db_pool, routine_id, name, notes).await?;
        self.bus.publish(TableSet::of(&[Table::Routines]));
        Ok(routine)
    }

    /// Delete a routine and its exercise entries. Workouts that were started
    /// from it keep their (now dangling) routine reference; the read side
    /// treats that as "no routine".
    pub async fn delete_routine(&self, routine_id: i64) -> Result<u64> {
        let deleted = delete_routine_cascade(&self.db_pool, routine_id).await?;
        #[cfg(debug_assertions)]
        self.diagnostics
            .cascade_deletes
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.bus
            .publish(TableSet::of(&[Table::Routines, Table::RoutineExercises]));
        Ok(deleted)
    }

    pub async fn add_exercise_to_routine(
        &self,
        routine_id: i64,
        exercise_id: i64,
        target_sets: i64,
        target_reps: i64,
    ) -> Result<RoutineExercise> {
        let entry = add_routine_exercise(
            &self.db_pool,
            routine_id,
            exercise_id,
            target_sets,
            target_reps,
        )
        .await?;
        self.bus.publish(TableSet::of(&[Table::RoutineExercises]));
        Ok(entry)
    }

    pub async fn routine_exercises(&self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        routine_exercises_for(&self.db_pool, routine_id).await
    }

    pub async fn remove_exercise_from_routine(&self, routine_exercise_id: i64) -> Result<u64> {
        let removed = remove_routine_exercise(&self.db_pool, routine_exercise_id).await?;
        self.bus.publish(TableSet::of(&[Table::RoutineExercises]));
        Ok(removed)
    }

    /// Reassign positions to match `ordered_ids`, front to back.
    pub async fn reorder_routine(&self, routine_id: i64, ordered_ids: &[i64]) -> Result<()> {
        reorder_routine_exercises(&self.db_pool, routine_id, ordered_ids).await?;
        self.bus.publish(TableSet::of(&[Table::RoutineExercises]));
        Ok(())
    }

    pub async fn set_routine_targets(
        &self,
        routine_exercise_id: i64,
        target_sets: i64,
        target_reps: i64,
    ) -> Result<()> {
        update_routine_targets(&self.db_pool, routine_exercise_id, target_sets, target_reps)
            .await?;
        self.bus.publish(TableSet::of(&[Table::RoutineExercises]));
        Ok(())
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
    async fn deleting_a_routine_removes_its_entries() {
        let session = test_session().await;
        let routine = session.create_routine("Legs", Some("heavy")).await.unwrap();
        session
            .add_exercise_to_routine(routine.id, 1, 3, 8)
            .await
            .unwrap();
        session
            .add_exercise_to_routine(routine.id, 2, 4, 6)
            .await
            .unwrap();

        session.delete_routine(routine.id).await.unwrap();

        assert!(session.get_routine(routine.id).await.unwrap().is_none());
        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM routine_exercises WHERE routine_id = ?1")
                .bind(routine.id)
                .fetch_one(&session.db_pool)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn reorder_assigns_dense_positions_in_given_order() {
        let session = test_session().await;
        let routine = session.create_routine("Upper", None).await.unwrap();
        let a = session
            .add_exercise_to_routine(routine.id, 1, 3, 8)
            .await
            .unwrap();
        let b = session
            .add_exercise_to_routine(routine.id, 2, 3, 8)
            .await
            .unwrap();
        let c = session
            .add_exercise_to_routine(routine.id, 3, 3, 8)
            .await
            .unwrap();

        session
            .reorder_routine(routine.id, &[c.id, a.id, b.id])
            .await
            .unwrap();

        let entries = session.routine_exercises(routine.id).await.unwrap();
        assert_eq!(
            entries.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![c.id, a.id, b.id]
        );
        assert_eq!(
            entries.iter().map(|e| e.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
