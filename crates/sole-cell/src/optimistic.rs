//! Optimistic strategy
//!
//! No lock at all: a caller that finds the cell empty constructs its own
//! value and offers it. The first publication wins and losing values are
//! dropped. The factory must therefore tolerate redundant calls, but only one
//! result is ever observed.

use crate::cell::{InstanceCell, Published};
use crate::error::ConstructionResult;
use crate::strategy::{construct_logged, Factory, Strategy, StrategyKind};
use std::sync::Arc;

/// Racing construction with first-publish-wins
#[derive(Debug)]
pub struct Optimistic<T> {
    cell: InstanceCell<T>,
}

impl<T> Optimistic<T> {
    /// Create empty strategy
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: InstanceCell::new(),
        }
    }
}

impl<T> Default for Optimistic<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Strategy<T> for Optimistic<T> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Optimistic
    }

    fn get_or_construct(&self, factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>> {
        if let Some(instance) = self.cell.get() {
            return Ok(instance);
        }

        let value = construct_logged(StrategyKind::Optimistic, factory)?;
        match self.cell.publish(value) {
            Published::Won(instance) => {
                tracing::info!(strategy = %StrategyKind::Optimistic, "instance published");
                Ok(instance)
            }
            Published::Lost(instance) => {
                tracing::debug!(
                    strategy = %StrategyKind::Optimistic,
                    "lost publication race, discarded redundant instance"
                );
                Ok(instance)
            }
        }
    }

    fn peek(&self) -> Option<Arc<T>> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn racing_callers_observe_one_instance() {
        let optimistic: Optimistic<usize> = Optimistic::new();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        let factory = || -> ConstructionResult<usize> {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(n)
        };

        let results: Vec<Arc<usize>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        optimistic.get_or_construct(&factory).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Redundant constructions are allowed, divergent observations are not
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn ready_cell_skips_factory() {
        let optimistic: Optimistic<u8> = Optimistic::new();
        optimistic.get_or_construct(&|| Ok(1)).unwrap();

        let calls = AtomicUsize::new(0);
        let factory = || -> ConstructionResult<u8> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        };
        assert_eq!(*optimistic.get_or_construct(&factory).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
