pub mod models;
pub mod operations;
pub mod query;

use log::{debug, info};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::StoreError;

/// Schema version the store runs at after all pending upgrades.
pub const SCHEMA_VERSION: i64 = 2;

const SETUP_TABLES: &str =
    include_str!("../../../migrations/2025-06-14-094100-0000_setup_tables/up.sql");
const TARGETS_AND_WEIGHT_LOG: &str =
    include_str!("../../../migrations/2025-07-21-181500-0000_targets_and_weight_log/up.sql");

/// Row transform run after a version's SQL, inside the same transaction.
#[derive(Debug, Clone, Copy)]
enum Transform {
    /// Fill in `target_sets`/`target_reps` on routine entries predating the
    /// columns. Rows already carrying values are left alone, so re-running
    /// is harmless.
    BackfillRoutineTargets,
}

struct SchemaVersion {
    version: i64,
    name: &'static str,
    up_sql: &'static str,
    transform: Option<Transform>,
}

const SCHEMA_VERSIONS: &[SchemaVersion] = &[
    SchemaVersion {
        version: 1,
        name: "setup_tables",
        up_sql: SETUP_TABLES,
        transform: None,
    },
    SchemaVersion {
        version: 2,
        name: "targets_and_weight_log",
        up_sql: TARGETS_AND_WEIGHT_LOG,
        transform: Some(Transform::BackfillRoutineTargets),
    },
];

/// Open (creating if missing) the database at `path` and apply the pragmas
/// every connection in this application runs with.
pub async fn connect(path: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    Ok(pool)
}

/// Bring the store up to [`SCHEMA_VERSION`]. A failed upgrade aborts with
/// the store still at the prior version; callers must treat that as fatal
/// rather than run against a half-migrated schema.
pub async fn init_store(pool: &SqlitePool) -> Result<(), StoreError> {
    apply_versions(pool, SCHEMA_VERSIONS).await
}

pub async fn current_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM _schema_versions")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn init_versions_table(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _schema_versions (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER))
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn apply_versions(pool: &SqlitePool, versions: &[SchemaVersion]) -> Result<(), StoreError> {
    init_versions_table(pool).await?;
    let applied = current_version(pool).await?;

    for schema in versions {
        if schema.version <= applied {
            debug!("schema version {} already applied, skipping", schema.version);
            continue;
        }

        info!("upgrading store to version {} ({})", schema.version, schema.name);

        let upgrade = |reason: String| StoreError::SchemaUpgrade {
            version: schema.version,
            reason,
        };

        let mut tx = pool.begin().await?;
        for statement in parse_sql_statements(schema.up_sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| upgrade(format!("{statement}: {e}")))?;
        }
        if let Some(transform) = schema.transform {
            apply_transform(transform, &mut *tx)
                .await
                .map_err(|e| upgrade(e.to_string()))?;
        }
        sqlx::query("INSERT INTO _schema_versions (version, name) VALUES (?1, ?2)")
            .bind(schema.version)
            .bind(schema.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| upgrade(e.to_string()))?;
        tx.commit().await.map_err(|e| upgrade(e.to_string()))?;

        info!("store now at version {}", schema.version);
    }

    Ok(())
}

async fn apply_transform(
    transform: Transform,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    match transform {
        Transform::BackfillRoutineTargets => {
            backfill_routine_targets(conn).await?;
        }
    }
    Ok(())
}

/// Default targets for routine entries that predate the target columns.
pub(crate) async fn backfill_routine_targets(
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let sets = sqlx::query("UPDATE routine_exercises SET target_sets = 1 WHERE target_sets IS NULL")
        .execute(&mut *conn)
        .await?;
    let reps = sqlx::query("UPDATE routine_exercises SET target_reps = 8 WHERE target_reps IS NULL")
        .execute(&mut *conn)
        .await?;
    Ok(sets.rows_affected() + reps.rows_affected())
}

fn parse_sql_statements(sql: &str) -> Vec<String> {
    sql.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("--")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shared in-memory pool for tests. Single connection so every handle sees
/// the same in-memory database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    init_store(&pool).await.expect("apply schema versions");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_store_reaches_current_version() {
        let pool = test_pool().await;
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let pool = test_pool().await;
        init_store(&pool).await.expect("second init");
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn backfill_skips_rows_already_migrated() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO routine_exercises (routine_id, exercise_id, position, target_sets, target_reps)
             VALUES (1, 1, 0, NULL, NULL), (1, 2, 1, 5, 12)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        backfill_routine_targets(&mut *conn).await.unwrap();
        let second_pass = backfill_routine_targets(&mut *conn).await.unwrap();
        // Release the pool's only connection before querying through it.
        drop(conn);
        assert_eq!(second_pass, 0);

        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT target_sets, target_reps FROM routine_exercises ORDER BY position")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(rows, vec![(1, 8), (5, 12)]);
    }

    #[tokio::test]
    async fn failed_upgrade_rolls_back_and_keeps_prior_version() {
        let pool = test_pool().await;
        let broken = [SchemaVersion {
            version: 3,
            name: "broken",
            up_sql: "CREATE TABLE extras (id INTEGER PRIMARY KEY);\n\
                     INSERT INTO no_such_table (id) VALUES (1);",
            transform: None,
        }];

        let err = apply_versions(&pool, &broken).await.unwrap_err();
        assert!(matches!(err, StoreError::SchemaUpgrade { version: 3, .. }));
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);

        // The first statement of the failed version must not survive.
        let extras: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'extras'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(extras, 0);
    }
}
