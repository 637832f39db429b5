//! Keyed singleton registry
//!
//! Provides [`SingletonRegistry`], an explicitly owned cache of singletons
//! with one [`InstanceCell`] per key. Slot creation is atomic per key through
//! `DashMap`; construction runs on the cell, outside the map's shard lock, so
//! a slow constructor for one key never blocks lookups of another.
//!
//! A plain shared map that checks for a key and inserts on miss would let two
//! callers construct the same key. Here each key keeps the cell's guarantee:
//! at most one successful construction.

use crate::cell::InstanceCell;
use crate::error::ConstructionResult;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Process-scoped registry of per-key singletons
#[derive(Debug)]
pub struct SingletonRegistry<K, T>
where
    K: Eq + Hash,
{
    cells: DashMap<K, Arc<InstanceCell<T>>>,
}

impl<K, T> SingletonRegistry<K, T>
where
    K: Eq + Hash + Clone,
{
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Cell for `key`, created empty on first use
    fn cell(&self, key: &K) -> Arc<InstanceCell<T>> {
        if let Some(cell) = self.cells.get(key) {
            return Arc::clone(cell.value());
        }
        Arc::clone(
            self.cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new(InstanceCell::new()))
                .value(),
        )
    }

    /// Return the instance for `key`, constructing it if needed
    ///
    /// Concurrent callers for the same key wait for a single construction.
    /// A failed construction leaves the key empty for the next caller.
    ///
    /// # Errors
    /// Returns the factory's error when this caller was constructing.
    pub fn get_or_construct<F>(&self, key: K, factory: F) -> ConstructionResult<Arc<T>>
    where
        F: FnOnce(&K) -> ConstructionResult<T>,
    {
        let cell = self.cell(&key);
        cell.get_or_construct(|| {
            tracing::debug!("constructing registry entry");
            factory(&key)
        })
    }

    /// Published instance for `key`
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<T>> {
        self.cells.get(key).and_then(|cell| cell.value().get())
    }

    /// Check if `key` has a published instance
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of published instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|entry| entry.value().is_ready()).count()
    }

    /// Check if no instance is published
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with published instances
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.cells
            .iter()
            .filter(|entry| entry.value().is_ready())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl<K, T> Default for SingletonRegistry<K, T>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructionError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Shape {
        OvalFill,
        OvalNoFill,
        Line,
    }

    #[test]
    fn registry_starts_empty() {
        let registry: SingletonRegistry<Shape, String> = SingletonRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(&Shape::Line));
    }

    #[test]
    fn registry_one_instance_per_key() {
        let registry = SingletonRegistry::new();

        let a = registry.get_or_construct(Shape::OvalFill, |s| Ok(format!("{s:?}"))).unwrap();
        let b = registry.get_or_construct(Shape::OvalFill, |_| Ok("other".to_string())).unwrap();
        let c = registry.get_or_construct(Shape::Line, |s| Ok(format!("{s:?}"))).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
        assert_eq!(*registry.get(&Shape::OvalFill).unwrap(), "OvalFill");
    }

    #[test]
    fn registry_failed_key_stays_empty() {
        let registry: SingletonRegistry<Shape, u8> = SingletonRegistry::new();

        let err = registry
            .get_or_construct(Shape::OvalNoFill, |_| Err(ConstructionError::failed("no paint")))
            .unwrap_err();
        assert!(matches!(err, ConstructionError::Failed(_)));
        assert!(!registry.contains(&Shape::OvalNoFill));
        assert!(registry.keys().is_empty());

        registry.get_or_construct(Shape::OvalNoFill, |_| Ok(1)).unwrap();
        assert_eq!(registry.keys(), vec![Shape::OvalNoFill]);
    }

    #[test]
    fn registry_constructs_each_key_once_under_contention() {
        let registry: SingletonRegistry<Shape, usize> = SingletonRegistry::new();
        let calls = AtomicUsize::new(0);
        let shapes = [Shape::OvalFill, Shape::OvalNoFill, Shape::Line];

        thread::scope(|s| {
            for i in 0..30 {
                let registry = &registry;
                let calls = &calls;
                let shape = shapes[i % shapes.len()];
                s.spawn(move || {
                    registry
                        .get_or_construct(shape, |_| {
                            thread::sleep(std::time::Duration::from_millis(5));
                            Ok(calls.fetch_add(1, Ordering::SeqCst))
                        })
                        .unwrap()
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(registry.len(), 3);
    }
}
