use thiserror::Error;

/// Typed storage-layer error. Session and view code propagates these through
/// `anyhow`, where they stay downcastable for callers that need to
/// distinguish constraint violations from transient database trouble.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("schema upgrade to version {version} failed: {reason}")]
    SchemaUpgrade { version: i64, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Map a sqlx error onto the typed store error, promoting integrity
/// violations (duplicate singleton key, CHECK failures) to `Constraint`.
pub(crate) fn map_db_err(e: sqlx::Error) -> StoreError {
    use sqlx::error::ErrorKind;

    if let sqlx::Error::Database(db) = &e {
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::CheckViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::ForeignKeyViolation => {
                return StoreError::Constraint(db.message().to_string());
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_upgrade_error_names_the_version() {
        let err = StoreError::SchemaUpgrade {
            version: 2,
            reason: "no such table: weight_entries".to_string(),
        };
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn plain_io_errors_stay_database_errors() {
        let err = map_db_err(sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
