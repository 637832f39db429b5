//! Construction strategy trait and shared plumbing
//!
//! A strategy decides whether and when the factory runs. All of them publish
//! through an [`InstanceCell`](crate::InstanceCell) or an equivalent
//! single-assignment slot, and none of them supports reset.

use crate::error::ConstructionResult;
use crate::latency::millis;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Zero-argument construction function
pub type Factory<'a, T> = dyn Fn() -> ConstructionResult<T> + Send + Sync + 'a;

/// Available construction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Construct before any caller can ask
    Eager,

    /// Lazy; every call takes the lock, no fast path
    Synchronized,

    /// Double-checked locking around the cell
    #[default]
    Guarded,

    /// Delegate to the runtime once-primitive
    Holder,

    /// No lock; construct and let the first publication win
    Optimistic,
}

impl StrategyKind {
    /// Every strategy, in declaration order
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Eager,
        StrategyKind::Synchronized,
        StrategyKind::Guarded,
        StrategyKind::Holder,
        StrategyKind::Optimistic,
    ];

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::Synchronized => "synchronized",
            Self::Guarded => "guarded",
            Self::Holder => "holder",
            Self::Optimistic => "optimistic",
        }
    }

    /// Label used when the caller does not pick one
    #[must_use]
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Eager => "Eager loading",
            Self::Synchronized => "Without lazy loading",
            Self::Guarded => "Lazy loading",
            Self::Holder => "Instance Holder",
            Self::Optimistic => "Optimistic loading",
        }
    }

    /// Whether a successful run invokes the factory exactly once
    ///
    /// The optimistic strategy may invoke it once per racing caller and keep
    /// only one result.
    #[must_use]
    pub fn constructs_once(self) -> bool {
        !matches!(self, Self::Optimistic)
    }

    /// Whether construction waits for the first caller
    #[must_use]
    pub fn is_lazy(self) -> bool {
        !matches!(self, Self::Eager)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown strategy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected eager, synchronized, guarded, holder or optimistic)")]
pub struct ParseStrategyError(pub String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "synchronized" | "sync" | "locked" => Ok(Self::Synchronized),
            "guarded" | "dcl" | "lazy" => Ok(Self::Guarded),
            "holder" => Ok(Self::Holder),
            "optimistic" | "race" => Ok(Self::Optimistic),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// A policy for constructing and publishing one shared instance
pub trait Strategy<T>: Send + Sync {
    /// Which policy this is
    fn kind(&self) -> StrategyKind;

    /// Return the instance, constructing it with `factory` if needed
    ///
    /// # Errors
    /// Returns the factory's error to the caller that ran it. The instance
    /// stays unpublished.
    fn get_or_construct(&self, factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>>;

    /// Like [`Strategy::get_or_construct`] but give up waiting after `timeout`
    ///
    /// `None` means this caller stopped waiting for another constructor. The
    /// instance is untouched and the factory was not run by this caller.
    /// The default suits strategies that never wait on another caller
    /// (eager, optimistic); every strategy that blocks overrides it.
    fn try_get_or_construct_for(
        &self,
        timeout: Duration,
        factory: &Factory<'_, T>,
    ) -> Option<ConstructionResult<Arc<T>>> {
        let _ = timeout;
        Some(self.get_or_construct(factory))
    }

    /// Published instance, if any
    fn peek(&self) -> Option<Arc<T>>;

    /// Check if the instance is published
    fn is_ready(&self) -> bool {
        self.peek().is_some()
    }
}

/// Run a factory with construction logging
pub(crate) fn construct_logged<T>(
    kind: StrategyKind,
    factory: &dyn Fn() -> ConstructionResult<T>,
) -> ConstructionResult<T> {
    tracing::debug!(strategy = %kind, "constructing instance");
    let start = Instant::now();

    match factory() {
        Ok(value) => {
            tracing::debug!(
                strategy = %kind,
                elapsed_ms = millis(start.elapsed()),
                "construction finished"
            );
            Ok(value)
        }
        Err(e) => {
            tracing::warn!(
                strategy = %kind,
                elapsed_ms = millis(start.elapsed()),
                error = %e,
                "construction failed, cell left empty"
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_name() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn kind_accepts_aliases() {
        assert_eq!("DCL".parse::<StrategyKind>().unwrap(), StrategyKind::Guarded);
        assert_eq!(" race ".parse::<StrategyKind>().unwrap(), StrategyKind::Optimistic);
        assert_eq!("sync".parse::<StrategyKind>().unwrap(), StrategyKind::Synchronized);
    }

    #[test]
    fn kind_rejects_unknown() {
        let err = "pool".parse::<StrategyKind>().unwrap_err();
        assert!(err.to_string().contains("unknown strategy 'pool'"));
    }

    #[test]
    fn kind_properties() {
        assert!(!StrategyKind::Eager.is_lazy());
        assert!(StrategyKind::Holder.is_lazy());
        assert!(StrategyKind::Synchronized.is_lazy());
        assert!(StrategyKind::Synchronized.constructs_once());
        assert!(StrategyKind::Guarded.constructs_once());
        assert!(!StrategyKind::Optimistic.constructs_once());
        assert_eq!(StrategyKind::default(), StrategyKind::Guarded);
        assert_eq!(StrategyKind::Holder.default_label(), "Instance Holder");
        assert_eq!(StrategyKind::Synchronized.default_label(), "Without lazy loading");
        assert_eq!(StrategyKind::Eager.default_label(), "Eager loading");
    }
}
