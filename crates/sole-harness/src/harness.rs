//! Concurrent caller harness
//!
//! Spawns named caller threads that are released together and all ask one
//! [`Singleton<Resource>`] for its instance. Each caller logs the label it
//! observed and leaves a [`CallerRecord`] for the report.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::report::{HarnessReport, InterruptReport};
use crate::resource::{resource_factory, Resource};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sole_cell::{ConstructionResult, Latency, Singleton};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

/// What a caller got back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallerOutcome {
    /// Caller received an instance
    Observed {
        /// Address of the shared allocation
        identity: usize,
        /// Label of the instance
        label: String,
    },
    /// Caller constructed and failed
    Failed {
        /// Error message
        error: String,
        /// Failure was an interrupt
        interrupted: bool,
    },
}

impl CallerOutcome {
    /// Record the result of one `get_instance` call
    #[must_use]
    pub fn from_result(result: &ConstructionResult<Arc<Resource>>) -> Self {
        match result {
            Ok(instance) => Self::Observed {
                identity: Arc::as_ptr(instance) as usize,
                label: instance.label().to_string(),
            },
            Err(e) => Self::Failed {
                error: e.to_string(),
                interrupted: e.is_interrupted(),
            },
        }
    }

    /// Check if the caller received an instance
    #[inline]
    #[must_use]
    pub fn is_observed(&self) -> bool {
        matches!(self, Self::Observed { .. })
    }

    /// Check if the caller failed with an interrupt
    #[inline]
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Failed { interrupted: true, .. })
    }
}

/// One caller's view of the singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerRecord {
    /// Caller index
    pub caller: usize,
    /// Thread name
    pub thread: String,
    /// Result of the call
    #[serde(flatten)]
    pub outcome: CallerOutcome,
}

/// Caller harness
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Create harness
    ///
    /// # Errors
    /// Returns [`HarnessError::Invalid`] if the config does not validate.
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Harness configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn latency(&self) -> Latency {
        Latency::new(self.config.delay())
    }

    /// All callers ask for the instance built by the default factory
    ///
    /// # Errors
    /// Returns an error if setup construction fails or a caller thread
    /// cannot be spawned or panics.
    pub fn run(&self) -> HarnessResult<HarnessReport> {
        let strategy = self.config.strategy;
        let label = self.config.label_for(strategy);
        tracing::info!(%strategy, callers = self.config.callers, %label, "starting run");

        let single = Singleton::new(strategy, resource_factory(label, self.latency()))?;
        let started = Instant::now();
        let records = self.drive(|_| single.get_instance())?;

        Ok(HarnessReport::new(
            strategy,
            records,
            single.stats(),
            started.elapsed(),
        ))
    }

    /// Caller `i` offers `labels[i % len]` as its construction argument
    ///
    /// Only the constructing caller's label is used; every caller should see
    /// the same one.
    ///
    /// # Errors
    /// Returns [`HarnessError::Invalid`] if no labels are configured,
    /// otherwise as [`Harness::run`].
    pub fn race(&self) -> HarnessResult<HarnessReport> {
        let labels = &self.config.labels;
        if labels.is_empty() {
            return Err(HarnessError::Invalid(
                "race needs at least one label".to_string(),
            ));
        }
        let strategy = self.config.strategy;
        tracing::info!(%strategy, callers = self.config.callers, ?labels, "starting race");

        let latency = self.latency();
        let single = Singleton::new(
            strategy,
            resource_factory(self.config.label_for(strategy), latency.clone()),
        )?;
        let started = Instant::now();
        let records = self.drive(|caller| {
            let label = &labels[caller % labels.len()];
            single.get_instance_with(resource_factory(label.clone(), latency.clone()))
        })?;

        Ok(HarnessReport::new(
            strategy,
            records,
            single.stats(),
            started.elapsed(),
        ))
    }

    /// Interrupt the first constructor mid-delay, then retry
    ///
    /// # Errors
    /// Returns [`HarnessError::Invalid`] for the eager strategy, which
    /// constructs during setup, otherwise as [`Harness::run`].
    pub fn run_interrupted(&self) -> HarnessResult<InterruptReport> {
        let strategy = self.config.strategy;
        if !strategy.is_lazy() {
            return Err(HarnessError::Invalid(format!(
                "{strategy} constructs during setup; nothing to interrupt"
            )));
        }
        tracing::info!(%strategy, delay_ms = self.config.construction_delay_ms, "starting interrupt run");

        let latency = self.latency();
        let interrupter = latency.interrupter().clone();
        let make = resource_factory(self.config.label_for(strategy), latency);
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let single = Singleton::new(strategy, move || {
            started_tx.send(()).ok();
            make()
        })?;

        let first = thread::scope(|s| -> HarnessResult<CallerRecord> {
            let constructor = thread::Builder::new()
                .name("constructor".to_string())
                .spawn_scoped(s, || record(0, &single.get_instance()))
                .map_err(HarnessError::Spawn)?;

            if started_rx.recv().is_ok() {
                tracing::info!("interrupting constructor");
                interrupter.interrupt();
            }
            constructor
                .join()
                .map_err(|_| HarnessError::CallerPanicked { caller: 0 })
        })?;
        let ready_after_interrupt = single.is_ready();

        tracing::info!("retrying construction");
        let retry = record(1, &single.get_instance());

        Ok(InterruptReport {
            strategy,
            first,
            ready_after_interrupt,
            retry,
            stats: single.stats(),
        })
    }

    fn drive<F>(&self, call: F) -> HarnessResult<Vec<CallerRecord>>
    where
        F: Fn(usize) -> ConstructionResult<Arc<Resource>> + Sync,
    {
        let callers = self.config.callers;
        let gate = RwLock::new(());

        thread::scope(|s| -> HarnessResult<Vec<CallerRecord>> {
            // Callers block on the gate until every thread is spawned
            let release = gate.write();
            let mut handles = Vec::with_capacity(callers);
            for caller in 0..callers {
                let gate = &gate;
                let call = &call;
                let handle = thread::Builder::new()
                    .name(format!("caller-{caller}"))
                    .spawn_scoped(s, move || {
                        drop(gate.read());
                        record(caller, &call(caller))
                    })
                    .map_err(HarnessError::Spawn)?;
                handles.push(handle);
            }
            drop(release);

            handles
                .into_iter()
                .enumerate()
                .map(|(caller, handle)| {
                    handle
                        .join()
                        .map_err(|_| HarnessError::CallerPanicked { caller })
                })
                .collect()
        })
    }
}

fn record(caller: usize, result: &ConstructionResult<Arc<Resource>>) -> CallerRecord {
    let thread = thread::current().name().unwrap_or("unnamed").to_string();
    match result {
        Ok(instance) => instance.announce(),
        Err(e) => tracing::warn!(caller, error = %e, "caller failed"),
    }
    CallerRecord {
        caller,
        thread,
        outcome: CallerOutcome::from_result(result),
    }
}
