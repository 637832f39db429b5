//! Deferred holder strategy
//!
//! Construction is handed to the runtime once-primitive behind
//! [`InstanceCell::get_or_construct`]. The once-primitive guarantees a
//! single, on-demand evaluation and releases blocked callers to retry when
//! an evaluation fails.
//!
//! The once-primitive has no timed wait, so the holder also tracks whether an
//! evaluation is in flight. Timed callers wait on that count and only enter
//! the once-primitive when nothing is running.

use crate::cell::InstanceCell;
use crate::error::ConstructionResult;
use crate::strategy::{construct_logged, Factory, Strategy, StrategyKind};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Instance evaluated once by the once-primitive
#[derive(Debug)]
pub struct Holder<T> {
    cell: InstanceCell<T>,
    in_flight: Mutex<usize>,
    settled: Condvar,
}

/// Counts an evaluation as running; uncounts it and wakes timed waiters
/// when dropped, including on unwind
struct InFlight<'a> {
    count: &'a Mutex<usize>,
    settled: &'a Condvar,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a Mutex<usize>, settled: &'a Condvar) -> Self {
        *count.lock() += 1;
        Self { count, settled }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.count.lock() -= 1;
        self.settled.notify_all();
    }
}

impl<T> Holder<T> {
    /// Create empty holder
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: InstanceCell::new(),
            in_flight: Mutex::new(0),
            settled: Condvar::new(),
        }
    }
}

impl<T> Default for Holder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Strategy<T> for Holder<T> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Holder
    }

    fn get_or_construct(&self, factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>> {
        if let Some(instance) = self.cell.get() {
            return Ok(instance);
        }

        let mut evaluation = None;
        let result = self.cell.get_or_construct(|| {
            evaluation = Some(InFlight::enter(&self.in_flight, &self.settled));
            construct_logged(StrategyKind::Holder, factory)
        });
        let constructed = evaluation.is_some();
        // Publication (or failure) is settled; wake timed waiters
        drop(evaluation);

        let instance = result?;
        if constructed {
            tracing::info!(strategy = %StrategyKind::Holder, "instance published");
        }
        Ok(instance)
    }

    fn try_get_or_construct_for(
        &self,
        timeout: Duration,
        factory: &Factory<'_, T>,
    ) -> Option<ConstructionResult<Arc<T>>> {
        if let Some(instance) = self.cell.get() {
            return Some(Ok(instance));
        }

        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.get_or_construct(factory));
        };
        let mut in_flight = self.in_flight.lock();
        while *in_flight > 0 {
            if self.settled.wait_until(&mut in_flight, deadline).timed_out() && *in_flight > 0 {
                tracing::debug!(
                    strategy = %StrategyKind::Holder,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "gave up waiting for evaluation"
                );
                return None;
            }
        }
        drop(in_flight);

        Some(self.get_or_construct(factory))
    }

    fn peek(&self) -> Option<Arc<T>> {
        self.cell.get()
    }
}
