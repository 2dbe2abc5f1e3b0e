use thiserror::Error;

/// Unified error type for autorel operations
#[derive(Error, Debug)]
pub enum AutorelError {
    #[error("History resolution failed: {0}")]
    HistoryResolution(String),

    #[error("History corrupt: {0}")]
    HistoryCorrupt(String),

    #[error("Spec parse failure: {0}")]
    SpecParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in autorel
pub type Result<T> = std::result::Result<T, AutorelError>;

impl AutorelError {
    /// Create a history-resolution error with context
    pub fn history_resolution(msg: impl Into<String>) -> Self {
        AutorelError::HistoryResolution(msg.into())
    }

    /// Create a history-corruption error with context
    pub fn history_corrupt(msg: impl Into<String>) -> Self {
        AutorelError::HistoryCorrupt(msg.into())
    }

    /// Create a spec-parse error with context
    pub fn spec_parse(msg: impl Into<String>) -> Self {
        AutorelError::SpecParse(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AutorelError::Config(msg.into())
    }
}
