//! Eager strategy
//!
//! The instance is built when the strategy is created, so every call finds
//! it ready. The cost is paid even if nobody ever asks.

use crate::error::ConstructionResult;
use crate::strategy::{construct_logged, Factory, Strategy, StrategyKind};
use std::sync::Arc;

/// Instance constructed up front
#[derive(Debug)]
pub struct Eager<T> {
    instance: Arc<T>,
}

impl<T> Eager<T> {
    /// Run `factory` now and hold its result
    ///
    /// # Errors
    /// Returns the factory's error; no strategy is created in that case.
    pub fn new(factory: &Factory<'_, T>) -> ConstructionResult<Self> {
        let value = construct_logged(StrategyKind::Eager, factory)?;
        tracing::info!(strategy = %StrategyKind::Eager, "instance published");
        Ok(Self::from_value(value))
    }

    /// Wrap an already built value
    #[inline]
    #[must_use]
    pub fn from_value(value: T) -> Self {
        Self {
            instance: Arc::new(value),
        }
    }

    /// The instance
    #[inline]
    #[must_use]
    pub fn instance(&self) -> Arc<T> {
        Arc::clone(&self.instance)
    }
}

impl<T: Send + Sync> Strategy<T> for Eager<T> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Eager
    }

    /// Ignores `factory`: the instance already exists
    fn get_or_construct(&self, _factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>> {
        Ok(self.instance())
    }

    fn peek(&self) -> Option<Arc<T>> {
        Some(self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructionError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn eager_constructs_before_first_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factory = move || -> ConstructionResult<String> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("ready".to_string())
        };

        let eager = Eager::new(&factory).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(eager.is_ready());

        let a = eager.get_or_construct(&factory).unwrap();
        let b = eager.get_or_construct(&|| Ok("other".to_string())).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn eager_propagates_failure() {
        let result = Eager::<u8>::new(&|| Err(ConstructionError::failed("boom")));
        assert!(matches!(result, Err(ConstructionError::Failed(_))));
    }
}
