//! Harness configuration
//!
//! Loaded from TOML, then overridden by command-line flags:
//!
//! ```toml
//! callers = 5
//! strategy = "guarded"
//! construction_delay_ms = 1000
//! label = "Lazy loading"
//! labels = ["A", "B"]
//! ```

use crate::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use sole_cell::StrategyKind;
use std::path::Path;
use std::time::Duration;

/// Caller harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Concurrent callers per run
    pub callers: usize,
    /// Construction strategy
    pub strategy: StrategyKind,
    /// Simulated construction delay
    pub construction_delay_ms: u64,
    /// Label for the instance; defaults to the strategy's label
    pub label: Option<String>,
    /// Competing labels for race runs
    pub labels: Vec<String>,
}

impl HarnessConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With caller count
    #[inline]
    #[must_use]
    pub fn with_callers(mut self, callers: usize) -> Self {
        self.callers = callers;
        self
    }

    /// With strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// With construction delay in milliseconds
    #[inline]
    #[must_use]
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.construction_delay_ms = ms;
        self
    }

    /// With instance label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// With race labels
    #[inline]
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Construction delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.construction_delay_ms)
    }

    /// Label for an instance built with `strategy`
    #[must_use]
    pub fn label_for(&self, strategy: StrategyKind) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| strategy.default_label().to_string())
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`HarnessError::Invalid`] for zero callers or blank labels.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.callers == 0 {
            return Err(HarnessError::Invalid("callers must be at least 1".to_string()));
        }
        if self.label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(HarnessError::Invalid("label must not be blank".to_string()));
        }
        if self.labels.iter().any(|l| l.trim().is_empty()) {
            return Err(HarnessError::Invalid("race labels must not be blank".to_string()));
        }
        Ok(())
    }

    /// Parse TOML configuration
    ///
    /// # Errors
    /// Returns [`HarnessError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load TOML configuration from `path`
    ///
    /// # Errors
    /// Returns [`HarnessError::Io`] if the file cannot be read, otherwise as
    /// [`HarnessConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| HarnessError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded harness config");
        Ok(config)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            callers: 5,
            strategy: StrategyKind::Guarded,
            construction_delay_ms: 1000,
            label: None,
            labels: vec!["A".to_string(), "B".to_string()],
        }
    }
}
