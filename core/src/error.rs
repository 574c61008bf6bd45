use thiserror::Error;

/// Errors surfaced by tracker operations.
///
/// Storage write failures never reach callers; the stores log them and keep
/// working in memory. `Persistence` is only returned when the database cannot
/// be opened.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Format(String),

    #[error("No foods in catalog")]
    EmptyCatalog,

    #[error("Storage error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl TrackerError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
