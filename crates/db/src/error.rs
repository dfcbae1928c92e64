use sercat_core::CoreError;

/// Storage-layer error taxonomy.
///
/// Serialization failures, deadlocks, and unique violations surface as
/// `Concurrency` so callers can distinguish a lost race from a
/// user-correctable validation failure and decide to retry or inform the
/// user.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Validation failed: {key}")]
    Validation { key: String },

    #[error("Concurrent modification: {0}")]
    Concurrency(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Shorthand for a validation failure with a message key.
    pub fn validation(key: impl Into<String>) -> Self {
        Self::Validation { key: key.into() }
    }

    /// Shorthand for a lost write race.
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::Concurrency(message.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if let Some(code) = db_err.code() {
                // 40001 serialization_failure, 40P01 deadlock_detected,
                // 23505 unique_violation: all mean another writer won.
                if matches!(code.as_ref(), "40001" | "40P01" | "23505") {
                    return Self::Concurrency(db_err.message().to_string());
                }
            }
        }
        Self::Database(err)
    }
}
