//! Testing utilities for Sole workspace
//!
//! Shared factories, call counters and concurrent caller helpers.

#![allow(missing_docs)]

use sole_cell::{ConstructionError, ConstructionResult, Latency};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Shared factory invocation counter
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the previous count
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Factory that counts calls and sleeps `delay` before building a value
pub fn counting_factory<T, F>(
    counter: &CallCounter,
    delay: Duration,
    make: F,
) -> impl Fn() -> ConstructionResult<T> + Send + Sync + 'static
where
    F: Fn() -> T + Send + Sync + 'static,
{
    let counter = counter.clone();
    move || {
        counter.hit();
        std::thread::sleep(delay);
        Ok(make())
    }
}

/// Factory that waits on `latency` (and can be interrupted) before building
pub fn interruptible_factory<T, F>(
    counter: &CallCounter,
    latency: Latency,
    make: F,
) -> impl Fn() -> ConstructionResult<T> + Send + Sync + 'static
where
    F: Fn() -> T + Send + Sync + 'static,
{
    let counter = counter.clone();
    move || {
        counter.hit();
        latency.wait()?;
        Ok(make())
    }
}

/// Factory whose first `failures` calls fail
pub fn flaky_factory<T, F>(
    counter: &CallCounter,
    failures: usize,
    make: F,
) -> impl Fn() -> ConstructionResult<T> + Send + Sync + 'static
where
    F: Fn() -> T + Send + Sync + 'static,
{
    let counter = counter.clone();
    move || {
        let n = counter.hit();
        if n < failures {
            Err(ConstructionError::failed(format!("attempt {n} failed")))
        } else {
            Ok(make())
        }
    }
}

/// Run `n` threads that start together and collect their results in order
pub fn spawn_callers<R, F>(n: usize, call: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync,
{
    let barrier = Barrier::new(n);
    thread::scope(|s| {
        let handles: Vec<_> = (0..n)
            .map(|i| {
                let barrier = &barrier;
                let call = &call;
                s.spawn(move || {
                    barrier.wait();
                    call(i)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("caller thread panicked"))
            .collect()
    })
}

/// Number of distinct allocations among `instances`
pub fn distinct_identities<T>(instances: &[Arc<T>]) -> usize {
    instances
        .iter()
        .map(|a| Arc::as_ptr(a).cast::<()>() as usize)
        .collect::<HashSet<_>>()
        .len()
}
