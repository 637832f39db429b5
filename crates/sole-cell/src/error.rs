//! Error types for singleton construction
//!
//! Construction is the only fallible step. Reads of a ready cell never fail,
//! and every error listed here leaves the cell empty so a later caller can
//! retry.

/// Errors reported to the caller that was constructing the instance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// The constructing thread was interrupted during its construction work
    #[error("construction interrupted after {elapsed_ms}ms")]
    Interrupted {
        /// Time spent constructing before the interrupt was observed
        elapsed_ms: u64,
    },

    /// The factory returned an error
    #[error("construction failed: {0}")]
    Failed(String),
}

impl ConstructionError {
    /// Create a factory failure
    #[inline]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Check whether the error came from an interrupt
    #[inline]
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// Check if a later caller may retry construction
    ///
    /// Always true: failures are never cached in the cell.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Result type alias for construction operations
pub type ConstructionResult<T> = Result<T, ConstructionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_display() {
        let err = ConstructionError::Interrupted { elapsed_ms: 12 };
        assert_eq!(err.to_string(), "construction interrupted after 12ms");
        assert!(err.is_interrupted());
    }

    #[test]
    fn failed_display() {
        let err = ConstructionError::failed("disk on fire");
        assert_eq!(err.to_string(), "construction failed: disk on fire");
        assert!(!err.is_interrupted());
    }

    #[test]
    fn all_errors_are_retryable() {
        assert!(ConstructionError::Interrupted { elapsed_ms: 0 }.is_retryable());
        assert!(ConstructionError::failed("x").is_retryable());
    }
}
