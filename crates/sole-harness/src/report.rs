//! Harness reports

use crate::harness::{CallerOutcome, CallerRecord};
use serde::{Deserialize, Serialize};
use sole_cell::{ConstructionStats, StrategyKind};
use std::collections::BTreeSet;
use std::time::Duration;

/// Result of a [`Harness::run`](crate::Harness::run) or
/// [`Harness::race`](crate::Harness::race)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessReport {
    /// Strategy under test
    pub strategy: StrategyKind,
    /// Number of callers
    pub callers: usize,
    /// One record per caller, in caller order
    pub records: Vec<CallerRecord>,
    /// Factory invocations, including setup construction
    pub stats: ConstructionStats,
    /// Wall time of the caller phase
    pub elapsed_ms: u64,
}

impl HarnessReport {
    /// Build report from caller records
    #[must_use]
    pub fn new(
        strategy: StrategyKind,
        records: Vec<CallerRecord>,
        stats: ConstructionStats,
        elapsed: Duration,
    ) -> Self {
        Self {
            strategy,
            callers: records.len(),
            records,
            stats,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Distinct instance addresses observed
    #[must_use]
    pub fn distinct_identities(&self) -> usize {
        self.records
            .iter()
            .filter_map(|r| match &r.outcome {
                CallerOutcome::Observed { identity, .. } => Some(*identity),
                CallerOutcome::Failed { .. } => None,
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct labels observed, sorted
    #[must_use]
    pub fn distinct_labels(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| match &r.outcome {
                CallerOutcome::Observed { label, .. } => Some(label.clone()),
                CallerOutcome::Failed { .. } => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Callers that did not receive an instance
    #[must_use]
    pub fn failed_callers(&self) -> Vec<&CallerRecord> {
        self.records
            .iter()
            .filter(|r| !r.outcome.is_observed())
            .collect()
    }

    /// Check if every caller saw the same instance
    ///
    /// Strategies that construct once must also have built exactly one value.
    #[must_use]
    pub fn passed(&self) -> bool {
        let single_build = !self.strategy.constructs_once() || self.stats.successes() == 1;
        self.failed_callers().is_empty()
            && self.distinct_identities() == 1
            && self.distinct_labels().len() == 1
            && single_build
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Sole Harness Report ===\n\n");
        report.push_str(&format!("Strategy: {} ({})\n", self.strategy, self.strategy.default_label()));
        report.push_str(&format!("Callers: {}\n", self.callers));
        report.push_str(&format!("Constructions: {}\n", self.stats.attempts));
        report.push_str(&format!("Construction Failures: {}\n", self.stats.failures));
        report.push_str(&format!("Distinct Instances: {}\n", self.distinct_identities()));
        report.push_str(&format!("Labels Observed: {}\n", self.distinct_labels().join(", ")));
        report.push_str(&format!("Elapsed: {}ms\n", self.elapsed_ms));

        let failed = self.failed_callers();
        if !failed.is_empty() {
            report.push_str("\n=== Failed Callers ===\n");
            for record in failed {
                if let CallerOutcome::Failed { error, .. } = &record.outcome {
                    report.push_str(&format!("{}: {}\n", record.thread, error));
                }
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Result of [`Harness::run_interrupted`](crate::Harness::run_interrupted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptReport {
    /// Strategy under test
    pub strategy: StrategyKind,
    /// Interrupted constructor
    pub first: CallerRecord,
    /// Whether an instance was published after the interrupt
    pub ready_after_interrupt: bool,
    /// Caller that retried after the interrupt
    pub retry: CallerRecord,
    /// Factory invocations
    pub stats: ConstructionStats,
}

impl InterruptReport {
    /// Check that the interrupt left the cell empty and the retry succeeded
    #[must_use]
    pub fn passed(&self) -> bool {
        self.first.outcome.is_interrupted()
            && !self.ready_after_interrupt
            && self.retry.outcome.is_observed()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Sole Interrupt Report ===\n\n");
        report.push_str(&format!("Strategy: {}\n", self.strategy));
        report.push_str(&format!("First Call: {}\n", describe(&self.first.outcome)));
        report.push_str(&format!("Ready After Interrupt: {}\n", self.ready_after_interrupt));
        report.push_str(&format!("Retry: {}\n", describe(&self.retry.outcome)));
        report.push_str(&format!("Constructions: {}\n", self.stats.attempts));
        report.push_str(&format!("Construction Failures: {}\n", self.stats.failures));
        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

fn describe(outcome: &CallerOutcome) -> String {
    match outcome {
        CallerOutcome::Observed { label, .. } => format!("observed '{label}'"),
        CallerOutcome::Failed { error, .. } => format!("failed ({error})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn observed(caller: usize, identity: usize, label: &str) -> CallerRecord {
        CallerRecord {
            caller,
            thread: format!("caller-{caller}"),
            outcome: CallerOutcome::Observed {
                identity,
                label: label.to_string(),
            },
        }
    }

    fn stats(attempts: u64, failures: u64) -> ConstructionStats {
        ConstructionStats { attempts, failures }
    }

    #[test]
    fn single_identity_passes() {
        let records = vec![observed(0, 7, "A"), observed(1, 7, "A")];
        let report = HarnessReport::new(StrategyKind::Guarded, records, stats(1, 0), Duration::ZERO);

        assert!(report.passed());
        assert_eq!(report.distinct_identities(), 1);
        assert!(report.generate_text().contains("Result: PASS"));
    }

    #[test]
    fn split_identity_fails() {
        let records = vec![observed(0, 7, "A"), observed(1, 9, "B")];
        let report = HarnessReport::new(StrategyKind::Optimistic, records, stats(2, 0), Duration::ZERO);

        assert!(!report.passed());
        assert_eq!(report.distinct_labels(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn double_build_fails_for_guarded_only() {
        let records = vec![observed(0, 7, "A"), observed(1, 7, "A")];

        let guarded =
            HarnessReport::new(StrategyKind::Guarded, records.clone(), stats(2, 0), Duration::ZERO);
        let optimistic =
            HarnessReport::new(StrategyKind::Optimistic, records, stats(2, 0), Duration::ZERO);

        assert!(!guarded.passed());
        assert!(optimistic.passed());
    }

    #[test]
    fn failed_caller_listed() {
        let mut records = vec![observed(0, 7, "A")];
        records.push(CallerRecord {
            caller: 1,
            thread: "caller-1".to_string(),
            outcome: CallerOutcome::Failed {
                error: "construction failed: boom".to_string(),
                interrupted: false,
            },
        });
        let report = HarnessReport::new(StrategyKind::Holder, records, stats(2, 1), Duration::ZERO);

        assert!(!report.passed());
        assert_eq!(report.failed_callers().len(), 1);
        assert!(report.generate_text().contains("caller-1: construction failed: boom"));
    }

    #[test]
    fn report_serializes_flattened_outcome() {
        let report = HarnessReport::new(
            StrategyKind::Holder,
            vec![observed(0, 7, "A")],
            stats(1, 0),
            Duration::from_millis(12),
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["strategy"], "holder");
        assert_eq!(json["records"][0]["outcome"], "observed");
        assert_eq!(json["records"][0]["label"], "A");
        assert_eq!(json["elapsed_ms"], 12);
    }
}
