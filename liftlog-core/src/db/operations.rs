//! Per-entity store operations.
//!
//! Every function takes the pool explicitly and runs one short-lived
//! statement or transaction; nothing here spans user think-time. Writes that
//! must hold an invariant together (cascade deletes, weight bookkeeping)
//! open an explicit transaction and roll back on the first error.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::models::{
    Exercise, ExerciseSetRow, NewExercise, PreviousPerformancePolicy, Profile, Routine,
    RoutineExercise, UpdateWorkoutSet, WeightEntry, WidgetPref, Workout, WorkoutExercise,
    WorkoutSet,
};
use crate::db::query::Select;
use crate::error::{StoreError, map_db_err};

// Profile

/// First-run creation of the singleton row. Fails with
/// [`StoreError::Constraint`] when the row already exists.
pub async fn create_profile(
    pool: &SqlitePool,
    name: &str,
    height_cm: f64,
    weight_kg: f64,
    now: i64,
) -> Result<Profile> {
    sqlx::query(
        "INSERT INTO profile (id, name, height_cm, weight_kg, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4)",
    )
    .bind(name)
    .bind(height_cm)
    .bind(weight_kg)
    .bind(now)
    .execute(pool)
    .await
    .map_err(map_db_err)?;

    get_profile(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile row missing after insert"))
}

pub async fn ensure_profile(pool: &SqlitePool, now: i64) -> Result<Profile> {
    sqlx::query(
        "INSERT OR IGNORE INTO profile (id, name, height_cm, weight_kg, updated_at)
         VALUES (1, '', 0, 0, ?1)",
    )
    .bind(now)
    .execute(pool)
    .await?;

    get_profile(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile row missing after ensure"))
}

pub async fn get_profile(pool: &SqlitePool) -> Result<Option<Profile>> {
    Select::from("profile")
        .eq("id", 1i64)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn update_profile(
    pool: &SqlitePool,
    name: &str,
    height_cm: f64,
    body_fat_percent: Option<f64>,
    now: i64,
) -> Result<Profile> {
    sqlx::query(
        "UPDATE profile SET name = ?1, height_cm = ?2, body_fat_percent = ?3, updated_at = ?4
         WHERE id = 1",
    )
    .bind(name)
    .bind(height_cm)
    .bind(body_fat_percent)
    .bind(now)
    .execute(pool)
    .await?;

    get_profile(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile row missing"))
}

/// Update the current weight and append the matching weight-log entry in one
/// transaction; this is the only path keeping the trend log consistent with
/// the profile field.
pub async fn update_profile_weight(
    pool: &SqlitePool,
    weight_kg: f64,
    date: &str,
    now: i64,
) -> Result<WeightEntry> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE profile SET weight_kg = ?1, updated_at = ?2 WHERE id = 1")
        .bind(weight_kg)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    let entry_id: i64 = sqlx::query_scalar(
        "INSERT INTO weight_entries (weight, date, created_at) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(weight_kg)
    .bind(date)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    get_weight_entry(pool, entry_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("weight entry missing after insert"))
}

// Exercises

pub async fn create_exercise(pool: &SqlitePool, new: &NewExercise) -> Result<Exercise> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO exercises (name, muscle_group, sub_muscle_group, equipment, aliases, is_custom)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(&new.name)
    .bind(&new.muscle_group)
    .bind(&new.sub_muscle_group)
    .bind(&new.equipment)
    .bind(&new.aliases)
    .bind(new.is_custom)
    .fetch_one(pool)
    .await
    .map_err(map_db_err)?;

    get_exercise(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("exercise {id} missing after insert"))
}

pub async fn get_exercise(pool: &SqlitePool, exercise_id: i64) -> Result<Option<Exercise>> {
    Select::from("exercises")
        .eq("id", exercise_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn get_all_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>> {
    Select::from("exercises")
        .order_by("name")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn get_exercises_by_muscle_group(
    pool: &SqlitePool,
    muscle_group: &str,
) -> Result<Vec<Exercise>> {
    Select::from("exercises")
        .eq("muscle_group", muscle_group)
        .order_by("name")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

/// Case-insensitive name/alias lookup.
pub async fn search_exercises(pool: &SqlitePool, term: &str) -> Result<Vec<Exercise>> {
    let pattern = format!("%{term}%");
    sqlx::query_as::<_, Exercise>(
        "SELECT * FROM exercises WHERE name LIKE ?1 OR aliases LIKE ?1 ORDER BY name",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

pub async fn count_exercises(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
        .fetch_one(pool)
        .await
        .map_err(Into::into)
}

pub async fn update_exercise(
    pool: &SqlitePool,
    exercise_id: i64,
    new: &NewExercise,
) -> Result<Exercise> {
    sqlx::query(
        "UPDATE exercises SET name = ?1, muscle_group = ?2, sub_muscle_group = ?3,
         equipment = ?4, aliases = ?5, is_custom = ?6 WHERE id = ?7",
    )
    .bind(&new.name)
    .bind(&new.muscle_group)
    .bind(&new.sub_muscle_group)
    .bind(&new.equipment)
    .bind(&new.aliases)
    .bind(new.is_custom)
    .bind(exercise_id)
    .execute(pool)
    .await?;

    get_exercise(pool, exercise_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("exercise {exercise_id} missing"))
}

/// Delete an exercise and every routine entry referencing it, re-compacting
/// the positions of the routines it was removed from.
pub async fn delete_exercise_cascade(pool: &SqlitePool, exercise_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let routine_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT DISTINCT routine_id FROM routine_exercises WHERE exercise_id = ?1",
    )
    .bind(exercise_id)
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM routine_exercises WHERE exercise_id = ?1")
        .bind(exercise_id)
        .execute(&mut *tx)
        .await?;
    for routine_id in routine_ids {
        compact_routine_positions(&mut tx, routine_id).await?;
    }

    let deleted = sqlx::query("DELETE FROM exercises WHERE id = ?1")
        .bind(exercise_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(deleted)
}

// Routines

pub async fn create_routine(
    pool: &SqlitePool,
    name: &str,
    notes: Option<&str>,
    now: i64,
) -> Result<Routine> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO routines (name, notes, created_at) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(name)
    .bind(notes)
    .bind(now)
    .fetch_one(pool)
    .await?;

    get_routine(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("routine {id} missing after insert"))
}

pub async fn get_routine(pool: &SqlitePool, routine_id: i64) -> Result<Option<Routine>> {
    Select::from("routines")
        .eq("id", routine_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn get_all_routines(pool: &SqlitePool) -> Result<Vec<Routine>> {
    Select::from("routines")
        .order_by_desc("created_at")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn update_routine(
    pool: &SqlitePool,
    routine_id: i64,
    name: &str,
    notes: Option<&str>,
) -> Result<Routine> {
    sqlx::query("UPDATE routines SET name = ?1, notes = ?2 WHERE id = ?3")
        .bind(name)
        .bind(notes)
        .bind(routine_id)
        .execute(pool)
        .await?;

    get_routine(pool, routine_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("routine {routine_id} missing"))
}

pub async fn delete_routine_cascade(pool: &SqlitePool, routine_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM routine_exercises WHERE routine_id = ?1")
        .bind(routine_id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM routines WHERE id = ?1")
        .bind(routine_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(deleted)
}

pub async fn add_routine_exercise(
    pool: &SqlitePool,
    routine_id: i64,
    exercise_id: i64,
    target_sets: i64,
    target_reps: i64,
) -> Result<RoutineExercise> {
    if target_sets < 1 {
        return Err(StoreError::Constraint("target_sets must be at least 1".to_string()).into());
    }

    let mut tx = pool.begin().await?;
    let position: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM routine_exercises WHERE routine_id = ?1")
            .bind(routine_id)
            .fetch_one(&mut *tx)
            .await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO routine_exercises (routine_id, exercise_id, position, target_sets, target_reps)
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(routine_id)
    .bind(exercise_id)
    .bind(position)
    .bind(target_sets)
    .bind(target_reps)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Select::from("routine_exercises")
        .eq("id", id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("routine exercise {id} missing after insert"))
}

pub async fn routine_exercises_for(
    pool: &SqlitePool,
    routine_id: i64,
) -> Result<Vec<RoutineExercise>> {
    Select::from("routine_exercises")
        .eq("routine_id", routine_id)
        .order_by("position")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn remove_routine_exercise(pool: &SqlitePool, routine_exercise_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let routine_id: Option<i64> =
        sqlx::query_scalar("SELECT routine_id FROM routine_exercises WHERE id = ?1")
            .bind(routine_exercise_id)
            .fetch_optional(&mut *tx)
            .await?;
    let deleted = sqlx::query("DELETE FROM routine_exercises WHERE id = ?1")
        .bind(routine_exercise_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if let Some(routine_id) = routine_id {
        compact_routine_positions(&mut tx, routine_id).await?;
    }
    tx.commit().await?;
    Ok(deleted)
}

pub async fn reorder_routine_exercises(
    pool: &SqlitePool,
    routine_id: i64,
    ordered_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await?;
    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query("UPDATE routine_exercises SET position = ?1 WHERE id = ?2 AND routine_id = ?3")
            .bind(position as i64)
            .bind(id)
            .bind(routine_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn update_routine_targets(
    pool: &SqlitePool,
    routine_exercise_id: i64,
    target_sets: i64,
    target_reps: i64,
) -> Result<()> {
    if target_sets < 1 {
        return Err(StoreError::Constraint("target_sets must be at least 1".to_string()).into());
    }
    sqlx::query("UPDATE routine_exercises SET target_sets = ?1, target_reps = ?2 WHERE id = ?3")
        .bind(target_sets)
        .bind(target_reps)
        .bind(routine_exercise_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// User-confirmed bulk target update after drift reconciliation.
pub async fn bulk_update_target_sets(
    pool: &SqlitePool,
    changes: &[(i64, i64)],
) -> Result<()> {
    if changes.iter().any(|&(_, sets)| sets < 1) {
        return Err(StoreError::Constraint("target_sets must be at least 1".to_string()).into());
    }
    let mut tx = pool.begin().await?;
    for &(routine_exercise_id, target_sets) in changes {
        sqlx::query("UPDATE routine_exercises SET target_sets = ?1 WHERE id = ?2")
            .bind(target_sets)
            .bind(routine_exercise_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn compact_routine_positions(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    routine_id: i64,
) -> Result<(), sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM routine_exercises WHERE routine_id = ?1 ORDER BY position",
    )
    .bind(routine_id)
    .fetch_all(&mut **tx)
    .await?;
    for (position, id) in ids.iter().enumerate() {
        sqlx::query("UPDATE routine_exercises SET position = ?1 WHERE id = ?2")
            .bind(position as i64)
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

// Workouts

pub async fn create_workout(
    pool: &SqlitePool,
    routine_id: Option<i64>,
    date: &str,
    start_time: i64,
) -> Result<Workout> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO workouts (routine_id, date, start_time) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(routine_id)
    .bind(date)
    .bind(start_time)
    .fetch_one(pool)
    .await?;

    get_workout(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("workout {id} missing after insert"))
}

pub async fn get_workout(pool: &SqlitePool, workout_id: i64) -> Result<Option<Workout>> {
    Select::from("workouts")
        .eq("id", workout_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn get_in_progress_workout(pool: &SqlitePool) -> Result<Option<Workout>> {
    Select::from("workouts")
        .is_null("end_time")
        .order_by_desc("start_time")
        .limit(1)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn complete_workout(pool: &SqlitePool, workout_id: i64, end_time: i64) -> Result<Workout> {
    sqlx::query("UPDATE workouts SET end_time = ?1 WHERE id = ?2")
        .bind(end_time)
        .bind(workout_id)
        .execute(pool)
        .await?;

    get_workout(pool, workout_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("workout {workout_id} missing"))
}

pub async fn set_workout_date(pool: &SqlitePool, workout_id: i64, date: &str) -> Result<()> {
    sqlx::query("UPDATE workouts SET date = ?1 WHERE id = ?2")
        .bind(date)
        .bind(workout_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn all_workouts(pool: &SqlitePool) -> Result<Vec<Workout>> {
    Select::from("workouts")
        .order_by_desc("date")
        .order_by_desc("start_time")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn completed_workouts_in_range(
    pool: &SqlitePool,
    from: &str,
    to: &str,
) -> Result<Vec<Workout>> {
    Select::from("workouts")
        .between("date", from, to)
        .is_not_null("end_time")
        .order_by_desc("date")
        .order_by_desc("start_time")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn all_completed_workouts(pool: &SqlitePool) -> Result<Vec<Workout>> {
    Select::from("workouts")
        .is_not_null("end_time")
        .order_by_desc("date")
        .order_by_desc("start_time")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

/// In-progress workouts started before `cutoff`, i.e. abandoned sessions
/// eligible for garbage collection.
pub async fn stale_in_progress_workouts(pool: &SqlitePool, cutoff: i64) -> Result<Vec<Workout>> {
    Select::from("workouts")
        .is_null("end_time")
        .lt("start_time", cutoff)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

/// Delete a workout and its descendants, strictly bottom-up (sets, then
/// workout exercises, then the workout) in one transaction.
pub async fn delete_workout_cascade(pool: &SqlitePool, workout_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "DELETE FROM sets WHERE workout_exercise_id IN
         (SELECT id FROM workout_exercises WHERE workout_id = ?1)",
    )
    .bind(workout_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM workout_exercises WHERE workout_id = ?1")
        .bind(workout_id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM workouts WHERE id = ?1")
        .bind(workout_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(deleted)
}

// Workout exercises and sets

pub async fn add_workout_exercise(
    pool: &SqlitePool,
    workout_id: i64,
    exercise_id: i64,
    position: i64,
) -> Result<WorkoutExercise> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO workout_exercises (workout_id, exercise_id, position)
         VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(workout_id)
    .bind(exercise_id)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Select::from("workout_exercises")
        .eq("id", id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("workout exercise {id} missing after insert"))
}

pub async fn workout_exercises_for(
    pool: &SqlitePool,
    workout_id: i64,
) -> Result<Vec<WorkoutExercise>> {
    Select::from("workout_exercises")
        .eq("workout_id", workout_id)
        .order_by("position")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn add_set(
    pool: &SqlitePool,
    workout_exercise_id: i64,
    weight: f64,
    reps: i64,
    completed: bool,
    rir: Option<i64>,
) -> Result<WorkoutSet> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO sets (workout_exercise_id, weight, reps, completed, rir)
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(workout_exercise_id)
    .bind(weight)
    .bind(reps)
    .bind(completed)
    .bind(rir)
    .fetch_one(pool)
    .await?;

    get_set(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("set {id} missing after insert"))
}

/// Empty placeholder sets created when a workout is instantiated from a
/// routine: weight and reps zero, not completed.
pub async fn add_placeholder_sets(
    pool: &SqlitePool,
    workout_exercise_id: i64,
    count: i64,
) -> Result<Vec<WorkoutSet>> {
    let mut tx = pool.begin().await?;
    for _ in 0..count {
        sqlx::query(
            "INSERT INTO sets (workout_exercise_id, weight, reps, completed) VALUES (?1, 0, 0, 0)",
        )
        .bind(workout_exercise_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    sets_for_workout_exercise(pool, workout_exercise_id).await
}

pub async fn get_set(pool: &SqlitePool, set_id: i64) -> Result<Option<WorkoutSet>> {
    Select::from("sets")
        .eq("id", set_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn sets_for_workout_exercise(
    pool: &SqlitePool,
    workout_exercise_id: i64,
) -> Result<Vec<WorkoutSet>> {
    Select::from("sets")
        .eq("workout_exercise_id", workout_exercise_id)
        .order_by("id")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn update_set(
    pool: &SqlitePool,
    set_id: i64,
    update: &UpdateWorkoutSet,
) -> Result<WorkoutSet> {
    let current = get_set(pool, set_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("set {set_id} missing"))?;

    let weight = update.weight.unwrap_or(current.weight);
    let reps = update.reps.unwrap_or(current.reps);
    let completed = update.completed.unwrap_or(current.completed);
    let rir = update.rir.unwrap_or(current.rir);

    sqlx::query("UPDATE sets SET weight = ?1, reps = ?2, completed = ?3, rir = ?4 WHERE id = ?5")
        .bind(weight)
        .bind(reps)
        .bind(completed)
        .bind(rir)
        .bind(set_id)
        .execute(pool)
        .await?;

    get_set(pool, set_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("set {set_id} missing after update"))
}

pub async fn delete_set(pool: &SqlitePool, set_id: i64) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM sets WHERE id = ?1")
        .bind(set_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted)
}

/// Completed-set count per exercise within one workout; drives drift
/// reconciliation against the routine's targets.
pub async fn completed_set_counts_for_workout(
    pool: &SqlitePool,
    workout_id: i64,
) -> Result<Vec<(i64, i64)>> {
    sqlx::query_as(
        "SELECT we.exercise_id, COUNT(s.id)
         FROM workout_exercises we
         JOIN sets s ON s.workout_exercise_id = we.id
         WHERE we.workout_id = ?1 AND s.completed = 1
         GROUP BY we.exercise_id",
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Every completed set of an exercise across completed workouts, newest
/// workout first. Feeds history and previous-performance selection.
pub async fn exercise_set_history(
    pool: &SqlitePool,
    exercise_id: i64,
) -> Result<Vec<ExerciseSetRow>> {
    sqlx::query_as(
        "SELECT w.id AS workout_id, w.routine_id, w.date, w.start_time,
                s.id, s.workout_exercise_id, s.weight, s.reps, s.completed, s.rir
         FROM sets s
         JOIN workout_exercises we ON s.workout_exercise_id = we.id
         JOIN workouts w ON we.workout_id = w.id
         WHERE we.exercise_id = ?1 AND s.completed = 1 AND w.end_time IS NOT NULL
         ORDER BY w.date DESC, w.start_time DESC, s.id",
    )
    .bind(exercise_id)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Completed sets joined with their exercise's muscle group, for volume
/// distribution over a date window.
pub async fn muscle_volume_rows(
    pool: &SqlitePool,
    from: &str,
    to: &str,
) -> Result<Vec<(String, f64, i64)>> {
    sqlx::query_as(
        "SELECT e.muscle_group, s.weight, s.reps
         FROM sets s
         JOIN workout_exercises we ON s.workout_exercise_id = we.id
         JOIN workouts w ON we.workout_id = w.id
         JOIN exercises e ON we.exercise_id = e.id
         WHERE s.completed = 1 AND w.end_time IS NOT NULL AND w.date BETWEEN ?1 AND ?2",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Completed sets with exercise identity in a date window, for personal
/// record selection.
pub async fn record_candidate_rows(
    pool: &SqlitePool,
    from: &str,
    to: &str,
) -> Result<Vec<(i64, String, f64, i64, String)>> {
    sqlx::query_as(
        "SELECT e.id, e.name, s.weight, s.reps, w.date
         FROM sets s
         JOIN workout_exercises we ON s.workout_exercise_id = we.id
         JOIN workouts w ON we.workout_id = w.id
         JOIN exercises e ON we.exercise_id = e.id
         WHERE s.completed = 1 AND w.end_time IS NOT NULL AND w.date BETWEEN ?1 AND ?2",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Lifetime completed volume per exercise.
pub async fn lifetime_volume_by_exercise(pool: &SqlitePool) -> Result<Vec<(i64, f64)>> {
    sqlx::query_as(
        "SELECT we.exercise_id, COALESCE(SUM(s.weight * s.reps), 0)
         FROM sets s
         JOIN workout_exercises we ON s.workout_exercise_id = we.id
         JOIN workouts w ON we.workout_id = w.id
         WHERE s.completed = 1 AND w.end_time IS NOT NULL
         GROUP BY we.exercise_id",
    )
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

// Weight entries

pub async fn get_weight_entry(pool: &SqlitePool, entry_id: i64) -> Result<Option<WeightEntry>> {
    Select::from("weight_entries")
        .eq("id", entry_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn all_weight_entries(pool: &SqlitePool) -> Result<Vec<WeightEntry>> {
    Select::from("weight_entries")
        .order_by_desc("date")
        .order_by_desc("created_at")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

pub async fn weight_entries_in_range(
    pool: &SqlitePool,
    from: &str,
    to: &str,
) -> Result<Vec<WeightEntry>> {
    Select::from("weight_entries")
        .between("date", from, to)
        .order_by("date")
        .order_by("created_at")
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

/// Explicit user edit of a logged entry; the append-only log is otherwise
/// written only through [`update_profile_weight`].
pub async fn update_weight_entry(
    pool: &SqlitePool,
    entry_id: i64,
    weight: f64,
    date: &str,
) -> Result<WeightEntry> {
    sqlx::query("UPDATE weight_entries SET weight = ?1, date = ?2 WHERE id = ?3")
        .bind(weight)
        .bind(date)
        .bind(entry_id)
        .execute(pool)
        .await?;

    get_weight_entry(pool, entry_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("weight entry {entry_id} missing"))
}

pub async fn delete_weight_entry(pool: &SqlitePool, entry_id: i64) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM weight_entries WHERE id = ?1")
        .bind(entry_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted)
}

pub async fn set_weight_entry_date(pool: &SqlitePool, entry_id: i64, date: &str) -> Result<()> {
    sqlx::query("UPDATE weight_entries SET date = ?1 WHERE id = ?2")
        .bind(date)
        .bind(entry_id)
        .execute(pool)
        .await?;
    Ok(())
}

// Widget preferences

pub async fn upsert_widget_pref(
    pool: &SqlitePool,
    widget_id: &str,
    glow_color: &str,
    now: i64,
) -> Result<WidgetPref> {
    sqlx::query(
        "INSERT INTO widget_prefs (id, glow_color, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET glow_color = excluded.glow_color,
                                       updated_at = excluded.updated_at",
    )
    .bind(widget_id)
    .bind(glow_color)
    .bind(now)
    .execute(pool)
    .await?;

    get_widget_pref(pool, widget_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("widget pref {widget_id} missing after upsert"))
}

pub async fn get_widget_pref(pool: &SqlitePool, widget_id: &str) -> Result<Option<WidgetPref>> {
    Select::from("widget_prefs")
        .eq("id", widget_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

pub async fn delete_widget_pref(pool: &SqlitePool, widget_id: &str) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM widget_prefs WHERE id = ?1")
        .bind(widget_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted)
}

// Settings

/// The stored previous-performance policy, defaulting to `routine_best`
/// when the settings row is absent or holds an unknown value.
pub async fn get_previous_performance_policy(
    pool: &SqlitePool,
) -> Result<PreviousPerformancePolicy> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT previous_performance FROM settings WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(stored
        .as_deref()
        .and_then(PreviousPerformancePolicy::parse)
        .unwrap_or_default())
}

pub async fn set_previous_performance_policy(
    pool: &SqlitePool,
    policy: PreviousPerformancePolicy,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (id, previous_performance) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET previous_performance = excluded.previous_performance",
    )
    .bind(policy.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn second_profile_insert_is_a_constraint_violation() {
        let pool = test_pool().await;
        create_profile(&pool, "A", 180.0, 80.0, 1).await.unwrap();
        let err = create_profile(&pool, "B", 170.0, 70.0, 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn ensure_profile_is_idempotent() {
        let pool = test_pool().await;
        ensure_profile(&pool, 10).await.unwrap();
        let profile = ensure_profile(&pool, 20).await.unwrap();
        assert_eq!(profile.updated_at, 10);
    }

    #[tokio::test]
    async fn routine_positions_stay_dense_after_removal() {
        let pool = test_pool().await;
        let routine = create_routine(&pool, "Push", None, 0).await.unwrap();
        let mut entries = Vec::new();
        for exercise_id in 1..=3 {
            entries.push(
                add_routine_exercise(&pool, routine.id, exercise_id, 3, 8)
                    .await
                    .unwrap(),
            );
        }

        remove_routine_exercise(&pool, entries[0].id).await.unwrap();
        let remaining = routine_exercises_for(&pool, routine.id).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(
            remaining.iter().map(|e| e.position).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn target_sets_below_one_is_rejected() {
        let pool = test_pool().await;
        let routine = create_routine(&pool, "Pull", None, 0).await.unwrap();
        let err = add_routine_exercise(&pool, routine.id, 1, 0, 8)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn workout_cascade_removes_all_descendants() {
        let pool = test_pool().await;
        let workout = create_workout(&pool, None, "2025-03-01", 1000).await.unwrap();
        let we = add_workout_exercise(&pool, workout.id, 1, 0).await.unwrap();
        add_set(&pool, we.id, 100.0, 5, true, None).await.unwrap();
        add_set(&pool, we.id, 100.0, 5, false, None).await.unwrap();

        delete_workout_cascade(&pool, workout.id).await.unwrap();

        let orphan_exercises: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM workout_exercises WHERE workout_id = ?1")
                .bind(workout.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        let orphan_sets: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sets WHERE workout_exercise_id = ?1",
        )
        .bind(we.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!((orphan_exercises, orphan_sets), (0, 0));
    }

    #[tokio::test]
    async fn weight_update_appends_exactly_one_entry() {
        let pool = test_pool().await;
        ensure_profile(&pool, 0).await.unwrap();

        update_profile_weight(&pool, 82.5, "2025-03-02", 5000)
            .await
            .unwrap();

        let profile = get_profile(&pool).await.unwrap().unwrap();
        assert_eq!(profile.weight_kg, 82.5);

        let entries = all_weight_entries(&pool).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weight, 82.5);
        assert_eq!(entries[0].date, "2025-03-02");
    }

    #[tokio::test]
    async fn policy_defaults_to_routine_best_when_unset() {
        let pool = test_pool().await;
        let policy = get_previous_performance_policy(&pool).await.unwrap();
        assert_eq!(policy, PreviousPerformancePolicy::RoutineBest);

        set_previous_performance_policy(&pool, PreviousPerformancePolicy::ExerciseLast)
            .await
            .unwrap();
        let policy = get_previous_performance_policy(&pool).await.unwrap();
        assert_eq!(policy, PreviousPerformancePolicy::ExerciseLast);
    }

    #[tokio::test]
    async fn stale_scan_only_returns_old_in_progress_rows() {
        let pool = test_pool().await;
        create_workout(&pool, None, "2025-01-01", 100).await.unwrap();
        let fresh = create_workout(&pool, None, "2025-03-01", 5000).await.unwrap();
        let done = create_workout(&pool, None, "2025-01-02", 200).await.unwrap();
        complete_workout(&pool, done.id, 300).await.unwrap();

        let stale = stale_in_progress_workouts(&pool, 1000).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].start_time, 100);
        assert_ne!(stale[0].id, fresh.id);
    }
}
