use thiserror::Error;

/// Failures surfaced by the task engine and its coordinator.
#[derive(Debug, Error)]
pub enum UpkeepError {
    /// A recurrence or snooze period did not match `<n>d`, `<n>w` or `<n>m`.
    #[error("Invalid period '{0}': expected a positive amount followed by d, w or m")]
    InvalidPeriod(String),

    /// The requested transition is not allowed for the current record.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Reported by the storage collaborator. Never retried.
    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl UpkeepError {
    pub fn validation(message: impl Into<String>) -> Self {
        UpkeepError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        UpkeepError::InvalidState(message.into())
    }

    /// Whether the caller sent something the engine rejects, as opposed to a
    /// collaborator failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, UpkeepError::Storage(_))
    }
}

pub type UpkeepResult<T> = std::result::Result<T, UpkeepError>;
