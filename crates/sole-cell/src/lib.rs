//! Sole Cell
//!
//! Thread-safe lazy singleton initialization.
//!
//! # Overview
//!
//! - **InstanceCell**: single-assignment slot with lock-free reads
//! - **Strategies**: [`Eager`], [`Synchronized`], [`GuardedLazy`], [`Holder`],
//!   [`Optimistic`]
//! - **Singleton**: strategy + default factory + construction counters
//! - **SingletonRegistry**: one cell per key, explicitly owned
//!
//! Construction errors go to the caller that was constructing and leave the
//! cell empty. Nothing is ever reset once published.
//!
//! # Example
//!
//! ```rust
//! use sole_cell::{Singleton, StrategyKind};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let single = Arc::new(Singleton::new(StrategyKind::Holder, || Ok(42u64)).unwrap());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let single = Arc::clone(&single);
//!         thread::spawn(move || single.get_instance().unwrap())
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     assert_eq!(*handle.join().unwrap(), 42);
//! }
//! assert_eq!(single.stats().attempts, 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cell;
pub mod eager;
pub mod error;
pub mod guarded;
pub mod holder;
pub mod latency;
pub mod optimistic;
pub mod registry;
pub mod singleton;
pub mod strategy;
pub mod synchronized;

// Re-exports
pub use cell::{InstanceCell, Published};
pub use eager::Eager;
pub use error::{ConstructionError, ConstructionResult};
pub use guarded::GuardedLazy;
pub use holder::Holder;
pub use latency::{Interrupter, Latency};
pub use optimistic::Optimistic;
pub use registry::SingletonRegistry;
pub use singleton::{ConstructionStats, Singleton};
pub use strategy::{Factory, ParseStrategyError, Strategy, StrategyKind};
pub use synchronized::Synchronized;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for singleton construction
    pub use crate::{
        ConstructionError, ConstructionResult, Interrupter, Latency, Singleton,
        SingletonRegistry, Strategy, StrategyKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
