//! One-shot startup repair of persisted date strings.
//!
//! Older builds derived `date` columns from UTC timestamps, which put
//! late-evening activity on the wrong calendar day. This pass re-derives
//! each row's date from its epoch timestamp in the local timezone. It runs
//! detached at startup and is strictly best-effort: a bad row is logged and
//! skipped, never a reason to abort the rest or block the application.

use anyhow::Result;
use chrono::{DateTime, Local};
use log::{info, warn};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db::operations::{
    all_weight_entries, all_workouts, set_weight_entry_date, set_workout_date,
};
use crate::live::{ChangeBus, Table, TableSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct RepairReport {
    pub repaired: u64,
    pub skipped: u64,
}

fn local_date_string(epoch: i64) -> Option<String> {
    let utc = DateTime::from_timestamp(epoch, 0)?;
    Some(
        utc.with_timezone(&Local)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string(),
    )
}

/// Rewrite workout and weight-entry dates that disagree with their
/// timestamp's local calendar day.
pub async fn normalize_dates(pool: &SqlitePool) -> Result<RepairReport> {
    let mut report = RepairReport::default();

    for workout in all_workouts(pool).await? {
        let Some(local_date) = local_date_string(workout.start_time) else {
            warn!(
                "workout {}: timestamp {} has no calendar date, skipping",
                workout.id, workout.start_time
            );
            report.skipped += 1;
            continue;
        };
        if local_date == workout.date {
            continue;
        }
        match set_workout_date(pool, workout.id, &local_date).await {
            Ok(()) => report.repaired += 1,
            Err(e) => {
                warn!("workout {}: date repair failed: {e:#}", workout.id);
                report.skipped += 1;
            }
        }
    }

    for entry in all_weight_entries(pool).await? {
        let Some(local_date) = local_date_string(entry.created_at) else {
            warn!(
                "weight entry {}: timestamp {} has no calendar date, skipping",
                entry.id, entry.created_at
            );
            report.skipped += 1;
            continue;
        };
        if local_date == entry.date {
            continue;
        }
        match set_weight_entry_date(pool, entry.id, &local_date).await {
            Ok(()) => report.repaired += 1,
            Err(e) => {
                warn!("weight entry {}: date repair failed: {e:#}", entry.id);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Run the repair detached from startup; the application never waits on it.
pub fn spawn(pool: SqlitePool, bus: Arc<ChangeBus>) {
    tokio::spawn(async move {
        match normalize_dates(&pool).await {
            Ok(report) if report.repaired > 0 => {
                info!(
                    "date repair rewrote {} rows ({} skipped)",
                    report.repaired, report.skipped
                );
                bus.publish(TableSet::of(&[Table::Workouts, Table::WeightEntries]));
            }
            Ok(_) => {}
            Err(e) => warn!("date repair did not finish: {e:#}"),
        }
    });
}
