//! Guarded lazy strategy (double-checked locking)
//!
//! Fast path: read the cell without locking. Slow path: take the cell's
//! lock, check again, construct only if still empty, publish, release. The
//! second check is what keeps callers that queued on the lock from running
//! the factory a second time.

use crate::cell::InstanceCell;
use crate::error::ConstructionResult;
use crate::strategy::{construct_logged, Factory, Strategy, StrategyKind};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Lazily constructed instance protected by a per-cell lock
#[derive(Debug)]
pub struct GuardedLazy<T> {
    cell: InstanceCell<T>,
    lock: Mutex<()>,
}

impl<T> GuardedLazy<T> {
    /// Create empty strategy
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: InstanceCell::new(),
            lock: Mutex::new(()),
        }
    }

    /// Second check and construction; caller holds `self.lock`
    fn construct_locked(&self, factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>> {
        if let Some(instance) = self.cell.get() {
            tracing::trace!("instance published while waiting for lock");
            return Ok(instance);
        }

        let value = construct_logged(StrategyKind::Guarded, factory)?;
        let published = self.cell.publish(value);
        debug_assert!(published.won(), "publication under the lock cannot lose");
        tracing::info!(strategy = %StrategyKind::Guarded, "instance published");
        Ok(published.into_inner())
    }
}

impl<T> Default for GuardedLazy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Strategy<T> for GuardedLazy<T> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Guarded
    }

    fn get_or_construct(&self, factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>> {
        if let Some(instance) = self.cell.get() {
            return Ok(instance);
        }

        let _guard = self.lock.lock();
        self.construct_locked(factory)
    }

    fn try_get_or_construct_for(
        &self,
        timeout: Duration,
        factory: &Factory<'_, T>,
    ) -> Option<ConstructionResult<Arc<T>>> {
        if let Some(instance) = self.cell.get() {
            return Some(Ok(instance));
        }

        let Some(_guard) = self.lock.try_lock_for(timeout) else {
            tracing::debug!(
                strategy = %StrategyKind::Guarded,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "gave up waiting for construction lock"
            );
            return None;
        };
        Some(self.construct_locked(factory))
    }

    fn peek(&self) -> Option<Arc<T>> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructionError;
    use crate::latency::Latency;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn guarded_is_lazy() {
        let guarded: GuardedLazy<u32> = GuardedLazy::new();
        assert!(!guarded.is_ready());

        let v = guarded.get_or_construct(&|| Ok(5)).unwrap();
        assert_eq!(*v, 5);
        assert!(guarded.is_ready());
    }

    #[test]
    fn guarded_constructs_once_under_contention() {
        let guarded: GuardedLazy<String> = GuardedLazy::new();
        let calls = AtomicUsize::new(0);
        let factory = || -> ConstructionResult<String> {
            calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            Ok("only".to_string())
        };

        let results: Vec<Arc<String>> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| guarded.get_or_construct(&factory).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn guarded_failure_is_not_cached() {
        let guarded: GuardedLazy<u8> = GuardedLazy::new();

        let err = guarded
            .get_or_construct(&|| Err(ConstructionError::failed("first try")))
            .unwrap_err();
        assert!(matches!(err, ConstructionError::Failed(_)));
        assert!(guarded.peek().is_none());

        assert_eq!(*guarded.get_or_construct(&|| Ok(2)).unwrap(), 2);
    }

    #[test]
    fn timed_waiter_gives_up_without_touching_cell() {
        let guarded = Arc::new(GuardedLazy::<String>::new());
        let latency = Latency::from_millis(300);
        let (started_tx, started_rx) = mpsc::channel();

        let constructor = {
            let guarded = Arc::clone(&guarded);
            thread::spawn(move || {
                guarded.get_or_construct(&|| {
                    started_tx.send(()).ok();
                    latency.wait()?;
                    Ok("slow".to_string())
                })
            })
        };

        started_rx.recv().unwrap();
        let waiter = guarded.try_get_or_construct_for(Duration::from_millis(10), &|| {
            Ok("impatient".to_string())
        });
        assert!(waiter.is_none());

        let winner = constructor.join().unwrap().unwrap();
        assert_eq!(*winner, "slow");
        assert!(Arc::ptr_eq(&winner, &guarded.peek().unwrap()));
    }

    #[test]
    fn timed_waiter_on_ready_cell_returns_instance() {
        let guarded: GuardedLazy<u8> = GuardedLazy::new();
        guarded.get_or_construct(&|| Ok(1)).unwrap();

        let result = guarded.try_get_or_construct_for(Duration::ZERO, &|| Ok(2));
        assert_eq!(*result.unwrap().unwrap(), 1);
    }
}
