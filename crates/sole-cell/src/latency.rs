//! Interruptible construction latency
//!
//! Construction of a singleton simulates expensive work with a fixed delay.
//! The delay runs on the constructing path only and can be cut short by an
//! [`Interrupter`], which surfaces as [`ConstructionError::Interrupted`].

use crate::error::{ConstructionError, ConstructionResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clonable handle used to interrupt a sleeping constructor
///
/// An interrupt is a pending flag. The next (or current) [`Interrupter::sleep`]
/// consumes it and fails, so a retry after the failure sleeps normally.
#[derive(Debug, Clone, Default)]
pub struct Interrupter {
    inner: Arc<InterruptState>,
}

#[derive(Debug, Default)]
struct InterruptState {
    pending: Mutex<bool>,
    signal: Condvar,
}

impl Interrupter {
    /// Create handle with no pending interrupt
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an interrupt and wake any sleeper
    pub fn interrupt(&self) {
        let mut pending = self.inner.pending.lock();
        *pending = true;
        self.inner.signal.notify_all();
    }

    /// Check for a pending interrupt without consuming it
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        *self.inner.pending.lock()
    }

    /// Sleep for `delay` unless interrupted
    ///
    /// # Errors
    /// Returns [`ConstructionError::Interrupted`] if an interrupt is pending
    /// when the sleep starts or arrives before the delay elapses. The
    /// interrupt is consumed.
    pub fn sleep(&self, delay: Duration) -> ConstructionResult<()> {
        let start = Instant::now();
        let deadline = start + delay;
        let mut pending = self.inner.pending.lock();

        loop {
            if *pending {
                *pending = false;
                return Err(ConstructionError::Interrupted {
                    elapsed_ms: millis(start.elapsed()),
                });
            }
            if Instant::now() >= deadline {
                return Ok(());
            }
            // Spurious wakeups and timeouts both loop back to the checks above
            let _ = self.inner.signal.wait_until(&mut pending, deadline);
        }
    }
}

/// Fixed construction delay bound to an interrupter
#[derive(Debug, Clone, Default)]
pub struct Latency {
    delay: Duration,
    interrupter: Interrupter,
}

impl Latency {
    /// Create latency with its own interrupter
    #[inline]
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            interrupter: Interrupter::new(),
        }
    }

    /// Create latency from milliseconds
    #[inline]
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Share an existing interrupter
    #[inline]
    #[must_use]
    pub fn with_interrupter(mut self, interrupter: Interrupter) -> Self {
        self.interrupter = interrupter;
        self
    }

    /// Configured delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Interrupter that can cut this latency short
    #[inline]
    #[must_use]
    pub fn interrupter(&self) -> &Interrupter {
        &self.interrupter
    }

    /// Run the delay
    ///
    /// # Errors
    /// Returns [`ConstructionError::Interrupted`] if interrupted.
    pub fn wait(&self) -> ConstructionResult<()> {
        self.interrupter.sleep(self.delay)
    }
}

pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
