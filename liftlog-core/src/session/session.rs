use anyhow::Result;
use chrono::{Local, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::catalog::seed_exercises;
use crate::db;
use crate::db::operations::ensure_profile;
use crate::live::ChangeBus;
use crate::repair;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// In-progress workouts older than this are considered abandoned and
    /// garbage-collected on store access.
    pub abandoned_retention_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            abandoned_retention_days: 7,
        }
    }
}

pub struct Session {
    pub db_pool: SqlitePool,
    pub bus: Arc<ChangeBus>,
    pub config: SessionConfig,
    #[cfg(debug_assertions)]
    pub diagnostics: Arc<crate::diagnostics::Diagnostics>,
}

impl Session {
    /// Open the store at `db_path`, apply pending schema upgrades, and run
    /// first-run setup. A schema-upgrade failure propagates out of here and
    /// must abort startup; everything downstream assumes the current
    /// version.
    pub async fn open(db_path: &str, config: SessionConfig) -> Result<Self> {
        let pool = db::connect(db_path).await?;
        db::init_store(&pool).await?;
        Self::from_pool(pool, config).await
    }

    /// Wire a session around an already-initialized pool. First-run setup
    /// (profile row, catalog seed), stale-workout collection, and the
    /// background date repair all happen here.
    pub async fn from_pool(pool: SqlitePool, config: SessionConfig) -> Result<Self> {
        let session = Self {
            db_pool: pool,
            bus: Arc::new(ChangeBus::new()),
            config,
            #[cfg(debug_assertions)]
            diagnostics: Arc::new(crate::diagnostics::Diagnostics::default()),
        };

        ensure_profile(&session.db_pool, session.now()).await?;
        seed_exercises(&session.db_pool).await?;
        session.collect_stale_workouts().await?;
        repair::spawn(session.db_pool.clone(), session.bus.clone());

        Ok(session)
    }

    pub(crate) fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    /// Today's local calendar date, the form every `date` column stores.
    pub(crate) fn today(&self) -> String {
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    }
}
