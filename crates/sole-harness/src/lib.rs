//! Sole Harness
//!
//! Drives concurrent callers against a [`sole_cell::Singleton`] and reports
//! whether they all observed one instance.
//!
//! # Example
//!
//! ```rust
//! use sole_harness::{Harness, HarnessConfig};
//! use sole_cell::StrategyKind;
//!
//! let config = HarnessConfig::new()
//!     .with_strategy(StrategyKind::Guarded)
//!     .with_callers(5)
//!     .with_delay_ms(20);
//!
//! let report = Harness::new(config).unwrap().run().unwrap();
//! assert!(report.passed());
//! assert_eq!(report.stats.attempts, 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod harness;
pub mod report;
pub mod resource;

pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use harness::{CallerOutcome, CallerRecord, Harness};
pub use report::{HarnessReport, InterruptReport};
pub use resource::{resource_factory, Resource};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
