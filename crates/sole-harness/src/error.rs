//! Error types for the caller harness

use sole_cell::{ConstructionError, ParseStrategyError};
use std::path::PathBuf;

/// Harness setup and execution errors
///
/// Construction errors seen by individual callers are recorded in the
/// report, not raised here. [`HarnessError::Construction`] only covers
/// construction that happens during setup (the eager strategy).
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`HarnessConfig`](crate::HarnessConfig)
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config values are out of range
    #[error("invalid config: {0}")]
    Invalid(String),

    /// Unknown strategy name
    #[error(transparent)]
    Strategy(#[from] ParseStrategyError),

    /// Construction failed while setting up the singleton
    #[error("setup construction failed: {0}")]
    Construction(#[from] ConstructionError),

    /// Caller thread could not be spawned
    #[error("failed to spawn caller thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Caller thread panicked
    #[error("caller {caller} panicked")]
    CallerPanicked {
        /// Index of the panicked caller
        caller: usize,
    },
}

impl HarnessError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
