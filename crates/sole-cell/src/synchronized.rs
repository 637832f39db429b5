//! Synchronized strategy
//!
//! The whole accessor runs under one lock: every call, including calls made
//! long after the instance exists, acquires it before looking at the slot.
//! This is the baseline the guarded strategy improves on with its lock-free
//! fast path.

use crate::error::ConstructionResult;
use crate::strategy::{construct_logged, Factory, Strategy, StrategyKind};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;

/// Lazily constructed instance; every access takes the lock
#[derive(Debug)]
pub struct Synchronized<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Synchronized<T> {
    /// Create empty strategy
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn get_locked(
        slot: &mut MutexGuard<'_, Option<Arc<T>>>,
        factory: &Factory<'_, T>,
    ) -> ConstructionResult<Arc<T>> {
        if let Some(instance) = slot.as_ref() {
            return Ok(Arc::clone(instance));
        }

        let instance = Arc::new(construct_logged(StrategyKind::Synchronized, factory)?);
        **slot = Some(Arc::clone(&instance));
        tracing::info!(strategy = %StrategyKind::Synchronized, "instance published");
        Ok(instance)
    }
}

impl<T> Default for Synchronized<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Strategy<T> for Synchronized<T> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Synchronized
    }

    fn get_or_construct(&self, factory: &Factory<'_, T>) -> ConstructionResult<Arc<T>> {
        let mut slot = self.slot.lock();
        Self::get_locked(&mut slot, factory)
    }

    fn try_get_or_construct_for(
        &self,
        timeout: Duration,
        factory: &Factory<'_, T>,
    ) -> Option<ConstructionResult<Arc<T>>> {
        let Some(mut slot) = self.slot.try_lock_for(timeout) else {
            tracing::debug!(
                strategy = %StrategyKind::Synchronized,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "gave up waiting for accessor lock"
            );
            return None;
        };
        Some(Self::get_locked(&mut slot, factory))
    }

    fn peek(&self) -> Option<Arc<T>> {
        self.slot.lock().clone()
    }
}
