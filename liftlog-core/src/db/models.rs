use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Singleton row (id = 1). `weight_kg` is the "current weight" field; every
/// write to it also appends a [`WeightEntry`].
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub body_fat_percent: Option<f64>,
    pub updated_at: i64,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub muscle_group: String,
    pub sub_muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub aliases: Option<String>,
    pub is_custom: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewExercise {
    pub name: String,
    pub muscle_group: String,
    pub sub_muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub aliases: Option<String>,
    pub is_custom: bool,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Routine {
    pub id: i64,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// One slot of a routine template. `position` is a dense 0-based rank within
/// the routine; the mutation layer keeps it dense across removals.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct RoutineExercise {
    pub id: i64,
    pub routine_id: i64,
    pub exercise_id: i64,
    pub position: i64,
    pub target_sets: i64,
    pub target_reps: i64,
}

/// A dated training session. `end_time` of `None` means in progress; the
/// mutation layer guarantees at most one such row exists.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Workout {
    pub id: i64,
    pub routine_id: Option<i64>,
    pub date: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

impl Workout {
    pub fn in_progress(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct WorkoutExercise {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub position: i64,
}

/// A performed (or planned) set. Only `completed` sets count toward volume
/// and records.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct WorkoutSet {
    pub id: i64,
    pub workout_exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub completed: bool,
    pub rir: Option<i64>,
}

impl WorkoutSet {
    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

impl fmt::Display for WorkoutSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rir = self.rir.map(|r| format!(" rir {r}")).unwrap_or_default();
        write!(f, "{:.1}kg x {} reps{}", self.weight, self.reps, rir)
    }
}

/// Partial update for a set; `None` keeps the stored value. `rir` is doubly
/// optional so callers can clear it explicitly.
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkoutSet {
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub completed: Option<bool>,
    pub rir: Option<Option<i64>>,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct WeightEntry {
    pub id: i64,
    pub weight: f64,
    pub date: String,
    pub created_at: i64,
}

/// Per-widget UI preference, keyed by a caller-supplied identifier string.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct WidgetPref {
    pub id: String,
    pub glow_color: String,
    pub updated_at: i64,
}

/// How "previous performance" picks the comparison workout for an exercise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreviousPerformancePolicy {
    /// Most recent prior workout under the same routine.
    RoutineLast,
    /// Highest-volume prior workout under the same routine.
    #[default]
    RoutineBest,
    /// Most recent prior workout across all routines.
    ExerciseLast,
    /// Highest-volume prior workout across all routines.
    ExerciseBest,
}

impl PreviousPerformancePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoutineLast => "routine_last",
            Self::RoutineBest => "routine_best",
            Self::ExerciseLast => "exercise_last",
            Self::ExerciseBest => "exercise_best",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "routine_last" => Some(Self::RoutineLast),
            "routine_best" => Some(Self::RoutineBest),
            "exercise_last" => Some(Self::ExerciseLast),
            "exercise_best" => Some(Self::ExerciseBest),
            _ => None,
        }
    }

    pub fn same_routine_only(&self) -> bool {
        matches!(self, Self::RoutineLast | Self::RoutineBest)
    }

    pub fn picks_best(&self) -> bool {
        matches!(self, Self::RoutineBest | Self::ExerciseBest)
    }
}

/// A completed set joined with the workout it was performed in; the raw
/// material for history and previous-performance lookups.
#[derive(FromRow, Debug, Clone)]
pub struct ExerciseSetRow {
    pub workout_id: i64,
    pub routine_id: Option<i64>,
    pub date: String,
    pub start_time: i64,
    pub id: i64,
    pub workout_exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub completed: bool,
    pub rir: Option<i64>,
}

impl ExerciseSetRow {
    pub fn set(&self) -> WorkoutSet {
        WorkoutSet {
            id: self.id,
            workout_exercise_id: self.workout_exercise_id,
            weight: self.weight,
            reps: self.reps,
            completed: self.completed,
            rir: self.rir,
        }
    }
}
