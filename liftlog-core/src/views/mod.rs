//! Read-side derivations.
//!
//! Every function here is a pure view of current store state plus explicit
//! parameters: join raw rows, aggregate, return a UI-ready structure. Rows
//! referencing deleted foreign keys are filtered out, never errors. Each
//! view exports the table footprint it reads so live subscriptions can
//! register it with the change bus.

pub mod analytics;
pub mod detail;
pub mod history;
pub mod previous;
pub mod streaks;
pub mod trend;

pub use analytics::{PersonalRecord, muscle_group_volume, personal_records};
pub use detail::{ExerciseDetail, WorkoutDetail, workout_detail};
pub use history::{HistoryEntry, exercise_history};
pub use previous::{PreviousPerformance, previous_performance};
pub use streaks::{Streaks, workout_streaks};
pub use trend::weight_trend;
