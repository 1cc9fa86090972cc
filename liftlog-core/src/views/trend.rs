//! Body-weight trend over a date window.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::models::WeightEntry;
use crate::db::operations::weight_entries_in_range;
use crate::live::{Table, TableSet};

pub const WEIGHT_TREND_TABLES: TableSet = TableSet::of(&[Table::WeightEntries]);

/// Entries in the window, oldest first, ready for a trend chart.
pub async fn weight_trend(pool: &SqlitePool, from: &str, to: &str) -> Result<Vec<WeightEntry>> {
    weight_entries_in_range(pool, from, to).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::update_profile_weight;
    use crate::db::test_pool;

    #[tokio::test]
    async fn returns_window_entries_oldest_first() {
        let pool = test_pool().await;
        update_profile_weight(&pool, 84.0, "2025-03-01", 1_000).await.unwrap();
        update_profile_weight(&pool, 83.2, "2025-03-05", 2_000).await.unwrap();
        update_profile_weight(&pool, 82.5, "2025-04-01", 3_000).await.unwrap();

        let trend = weight_trend(&pool, "2025-03-01", "2025-03-31").await.unwrap();
        assert_eq!(
            trend.iter().map(|e| e.weight).collect::<Vec<_>>(),
            vec![84.0, 83.2]
        );
    }
}
