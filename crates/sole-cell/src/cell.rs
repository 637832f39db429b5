//! Instance cell
//!
//! [`InstanceCell`] holds at most one constructed value. Publication goes
//! through an atomic once-slot, so a reader that sees the value also sees
//! every write the constructor made before publishing it.

use crate::error::ConstructionResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Single-assignment slot for a shared singleton value
///
/// The transition empty → ready happens at most once and is never undone.
/// Reads after that transition take no lock.
#[derive(Debug)]
pub struct InstanceCell<T> {
    slot: OnceCell<Arc<T>>,
}

/// Outcome of [`InstanceCell::publish`]
#[derive(Debug)]
pub enum Published<T> {
    /// The offered value became the instance
    Won(Arc<T>),
    /// Another value was already published; the offered one was dropped
    Lost(Arc<T>),
}

impl<T> Published<T> {
    /// The instance visible to every caller
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Arc<T> {
        match self {
            Self::Won(v) | Self::Lost(v) => v,
        }
    }

    /// Whether the offered value won
    #[inline]
    #[must_use]
    pub fn won(&self) -> bool {
        matches!(self, Self::Won(_))
    }
}

impl<T> InstanceCell<T> {
    /// Create empty cell
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// Lock-free read of the published instance
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.get().cloned()
    }

    /// Check if an instance has been published
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Publish `value` unless another value got there first
    pub fn publish(&self, value: T) -> Published<T> {
        match self.slot.try_insert(Arc::new(value)) {
            Ok(winner) => Published::Won(Arc::clone(winner)),
            Err((winner, _rejected)) => Published::Lost(Arc::clone(winner)),
        }
    }

    /// Return the instance, running `factory` if the cell is empty
    ///
    /// Concurrent callers block until the running factory finishes. On
    /// success every one of them receives the same instance and no other
    /// factory runs. On failure only the constructing caller gets the error;
    /// the cell stays empty and the next blocked caller runs its own factory.
    ///
    /// # Errors
    /// Returns the factory's error when this caller was the one constructing.
    pub fn get_or_construct<F>(&self, factory: F) -> ConstructionResult<Arc<T>>
    where
        F: FnOnce() -> ConstructionResult<T>,
    {
        self.slot
            .get_or_try_init(|| factory().map(Arc::new))
            .map(Arc::clone)
    }
}

impl<T> Default for InstanceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
