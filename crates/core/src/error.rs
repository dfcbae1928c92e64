use uuid::Uuid;

/// Error taxonomy for the registry core.
///
/// `Validation` carries a machine-readable message key and is always
/// user-correctable; it is never logged as a system fault. `Concurrency`
/// is surfaced distinctly so callers can decide to retry or inform the
/// user. `Mapping` is a programming/data-integrity fault and is
/// propagated, never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Validation failed: {key}")]
    Validation { key: String },

    #[error("Concurrent modification: {0}")]
    Concurrency(String),

    #[error("Mapping failed: {0}")]
    Mapping(String),

    #[error("Count limit exceeded: {0}")]
    CountLimit(String),
}

impl CoreError {
    /// Shorthand for a validation failure with a message key.
    pub fn validation(key: impl Into<String>) -> Self {
        Self::Validation { key: key.into() }
    }
}
