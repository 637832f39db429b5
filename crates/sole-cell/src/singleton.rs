//! Singleton facade
//!
//! [`Singleton`] binds a strategy to a default factory and counts factory
//! invocations. It is an ordinary owned value: share it with `Arc` or keep it
//! in a [`SingletonRegistry`](crate::SingletonRegistry) rather than in a
//! global.
//!
//! # First writer wins
//!
//! [`Singleton::get_instance_with`] accepts one-shot construction arguments
//! in the form of a factory. They only matter to the call that actually
//! constructs. Once an instance exists, calls with different arguments still
//! return the original instance:
//!
//! ```rust
//! use sole_cell::{Singleton, StrategyKind};
//!
//! let single = Singleton::new(StrategyKind::Guarded, || Ok("default".to_string())).unwrap();
//! let first = single.get_instance_with(|| Ok("Hello".to_string())).unwrap();
//! let second = single.get_instance_with(|| Ok("World".to_string())).unwrap();
//!
//! assert_eq!(*second, "Hello");
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```

use crate::eager::Eager;
use crate::error::ConstructionResult;
use crate::guarded::GuardedLazy;
use crate::holder::Holder;
use crate::optimistic::Optimistic;
use crate::strategy::{Factory, Strategy, StrategyKind};
use crate::synchronized::Synchronized;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of factory invocation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionStats {
    /// Factory invocations
    pub attempts: u64,
    /// Invocations that returned an error
    pub failures: u64,
}

impl ConstructionStats {
    /// Invocations that produced a value
    #[inline]
    #[must_use]
    pub fn successes(&self) -> u64 {
        self.attempts.saturating_sub(self.failures)
    }
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn observe<T>(&self, factory: &dyn Fn() -> ConstructionResult<T>) -> ConstructionResult<T> {
        self.attempts.fetch_add(1, Ordering::Release);
        let result = factory();
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::Release);
        }
        result
    }

    /// Reads failures first; each counted failure has its attempt counted
    fn snapshot(&self) -> ConstructionStats {
        let failures = self.failures.load(Ordering::Acquire);
        ConstructionStats {
            attempts: self.attempts.load(Ordering::Acquire),
            failures,
        }
    }
}

/// Shared instance built by a chosen strategy
pub struct Singleton<T> {
    strategy: Box<dyn Strategy<T>>,
    factory: Arc<Factory<'static, T>>,
    counters: Arc<Counters>,
}

impl<T: Send + Sync + 'static> Singleton<T> {
    /// Create singleton with `factory` as its default constructor
    ///
    /// The eager strategy constructs here; every other strategy waits for the
    /// first caller.
    ///
    /// # Errors
    /// Returns the factory's error if eager construction fails.
    pub fn new<F>(kind: StrategyKind, factory: F) -> ConstructionResult<Self>
    where
        F: Fn() -> ConstructionResult<T> + Send + Sync + 'static,
    {
        let factory: Arc<Factory<'static, T>> = Arc::new(factory);
        let counters = Arc::new(Counters::default());

        let strategy: Box<dyn Strategy<T>> = match kind {
            StrategyKind::Eager => {
                Box::new(Eager::new(&|| counters.observe(factory.as_ref()))?)
            }
            StrategyKind::Synchronized => Box::new(Synchronized::new()),
            StrategyKind::Guarded => Box::new(GuardedLazy::new()),
            StrategyKind::Holder => Box::new(Holder::new()),
            StrategyKind::Optimistic => Box::new(Optimistic::new()),
        };

        tracing::debug!(strategy = %kind, "singleton created");
        Ok(Self {
            strategy,
            factory,
            counters,
        })
    }
}

impl<T> Singleton<T> {
    /// Return the instance, constructing it with the default factory
    ///
    /// # Errors
    /// Returns the construction error if this caller constructed and failed.
    pub fn get_instance(&self) -> ConstructionResult<Arc<T>> {
        self.strategy
            .get_or_construct(&|| self.counters.observe(self.factory.as_ref()))
    }

    /// Return the instance, constructing it with `factory` if still empty
    ///
    /// `factory` is ignored once an instance exists (first writer wins).
    ///
    /// # Errors
    /// Returns the construction error if this caller constructed and failed.
    pub fn get_instance_with<F>(&self, factory: F) -> ConstructionResult<Arc<T>>
    where
        F: Fn() -> ConstructionResult<T> + Send + Sync,
    {
        self.strategy
            .get_or_construct(&|| self.counters.observe(&factory))
    }

    /// Like [`Singleton::get_instance`] but stop waiting after `timeout`
    ///
    /// `None` means this caller gave up while another caller was
    /// constructing. The cell is unaffected and the caller is not counted.
    /// The synchronized, guarded and holder strategies wait at most
    /// `timeout` for another constructor. Eager never waits, and optimistic
    /// callers construct on their own instead of waiting.
    pub fn get_instance_for(&self, timeout: Duration) -> Option<ConstructionResult<Arc<T>>> {
        self.strategy.try_get_or_construct_for(timeout, &|| {
            self.counters.observe(self.factory.as_ref())
        })
    }

    /// Published instance without constructing
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<Arc<T>> {
        self.strategy.peek()
    }

    /// Check if the instance is published
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.strategy.is_ready()
    }

    /// Strategy in use
    #[inline]
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Factory invocation counts so far
    #[inline]
    #[must_use]
    pub fn stats(&self) -> ConstructionStats {
        self.counters.snapshot()
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("strategy", &self.kind())
            .field("ready", &self.is_ready())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
