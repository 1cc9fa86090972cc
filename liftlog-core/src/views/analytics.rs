//! Volume distribution and personal records.

use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::db::operations::{
    lifetime_volume_by_exercise, muscle_volume_rows, record_candidate_rows,
};
use crate::live::{Table, TableSet};

pub const ANALYTICS_TABLES: TableSet = TableSet::of(&[
    Table::Workouts,
    Table::WorkoutExercises,
    Table::Sets,
    Table::Exercises,
]);

static MUSCLE_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,/;&]").expect("valid delimiter pattern"));

/// First token of a possibly multi-valued muscle-group field:
/// `"Back/Biceps"` and `"Back, Biceps"` both attribute to `"Back"`.
pub fn primary_muscle_group(raw: &str) -> &str {
    MUSCLE_DELIMITERS
        .split(raw)
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| raw.trim())
}

/// Completed-set volume per primary muscle group across completed workouts
/// in the window.
pub async fn muscle_group_volume(
    pool: &SqlitePool,
    from: &str,
    to: &str,
) -> Result<BTreeMap<String, f64>> {
    let mut totals = BTreeMap::new();
    for (muscle_group, weight, reps) in muscle_volume_rows(pool, from, to).await? {
        let primary = primary_muscle_group(&muscle_group).to_string();
        *totals.entry(primary).or_insert(0.0) += weight * reps as f64;
    }
    Ok(totals)
}

#[derive(Serialize, Debug, Clone)]
pub struct PersonalRecord {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: i64,
    pub date: String,
    /// Completed volume over all time, not just the window.
    pub lifetime_volume: f64,
}

/// Per exercise: the heaviest completed set in the window (ties broken by
/// higher reps) plus lifetime cumulative volume. Exercises with no completed
/// set in the window are omitted.
pub async fn personal_records(
    pool: &SqlitePool,
    from: &str,
    to: &str,
) -> Result<Vec<PersonalRecord>> {
    let lifetime: HashMap<i64, f64> = lifetime_volume_by_exercise(pool)
        .await?
        .into_iter()
        .collect();

    let mut best: HashMap<i64, PersonalRecord> = HashMap::new();
    for (exercise_id, name, weight, reps, date) in record_candidate_rows(pool, from, to).await? {
        let candidate = PersonalRecord {
            exercise_id,
            exercise_name: name,
            weight,
            reps,
            date,
            lifetime_volume: lifetime.get(&exercise_id).copied().unwrap_or(0.0),
        };
        let beats_current = match best.get(&exercise_id) {
            Some(current) => (candidate.weight, candidate.reps) > (current.weight, current.reps),
            None => true,
        };
        if beats_current {
            best.insert(exercise_id, candidate);
        }
    }

    let mut records: Vec<PersonalRecord> = best.into_values().collect();
    records.sort_by(|a, b| a.exercise_name.cmp(&b.exercise_name));
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_exercises;
    use crate::db::test_pool;
    use crate::views::testsupport::completed_workout;

    #[test]
    fn primary_token_wins_for_every_delimiter() {
        assert_eq!(primary_muscle_group("Back/Biceps"), "Back");
        assert_eq!(primary_muscle_group("Back, Biceps"), "Back");
        assert_eq!(primary_muscle_group("Chest & Triceps"), "Chest");
        assert_eq!(primary_muscle_group("Quads; Glutes"), "Quads");
        assert_eq!(primary_muscle_group("  Core  "), "Core");
    }

    #[tokio::test]
    async fn volume_is_attributed_to_the_primary_muscle_group() {
        let pool = test_pool().await;
        seed_exercises(&pool).await.unwrap();

        // Exercise 1 is seeded alphabetically; look two up by name instead.
        let chest: (i64,) =
            sqlx::query_as("SELECT id FROM exercises WHERE name = 'Barbell Bench Press'")
                .fetch_one(&pool)
                .await
                .unwrap();
        let multi: (i64,) = sqlx::query_as("SELECT id FROM exercises WHERE name = 'Pull Up'")
            .fetch_one(&pool)
            .await
            .unwrap();

        completed_workout(
            &pool,
            None,
            "2025-03-03",
            1_000_000,
            &[
                (chest.0, &[(100.0, 5, true), (100.0, 5, false)]),
                (multi.0, &[(0.0, 10, true), (20.0, 5, true)]),
            ],
        )
        .await;

        let totals = muscle_group_volume(&pool, "2025-03-01", "2025-03-31")
            .await
            .unwrap();
        assert_eq!(totals.get("Chest"), Some(&500.0));
        // Pull Up is "Back/Biceps": all of it lands on Back.
        assert_eq!(totals.get("Back"), Some(&100.0));
        assert!(!totals.contains_key("Biceps"));
    }

    #[tokio::test]
    async fn record_ties_break_toward_higher_reps() {
        let pool = test_pool().await;
        seed_exercises(&pool).await.unwrap();

        completed_workout(
            &pool,
            None,
            "2025-03-03",
            1_000_000,
            &[(1, &[(100.0, 5, true), (100.0, 8, true), (90.0, 12, true)])],
        )
        .await;

        let records = personal_records(&pool, "2025-03-01", "2025-03-31")
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, 100.0);
        assert_eq!(records[0].reps, 8);
        assert_eq!(records[0].lifetime_volume, 500.0 + 800.0 + 1080.0);
    }

    #[tokio::test]
    async fn lifetime_volume_reaches_outside_the_window() {
        let pool = test_pool().await;
        seed_exercises(&pool).await.unwrap();

        completed_workout(
            &pool,
            None,
            "2024-11-01",
            500_000,
            &[(1, &[(80.0, 10, true)])],
        )
        .await;
        completed_workout(
            &pool,
            None,
            "2025-03-03",
            1_000_000,
            &[(1, &[(100.0, 5, true)])],
        )
        .await;

        let records = personal_records(&pool, "2025-03-01", "2025-03-31")
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, 100.0);
        assert_eq!(records[0].lifetime_volume, 800.0 + 500.0);
    }
}
