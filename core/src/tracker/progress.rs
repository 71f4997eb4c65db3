//! Lock-guarded first-observation tracking

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::report::{Milestone, Report, ReportRecord};
use crate::workload::{TaskResult, UnitSnapshot, UnitState, WorkloadKind};

use super::summary::Summary;

/// Concurrency-safe record of per-unit milestone timings
///
/// Every mutation and the termination check take the same mutex. Critical
/// sections are a handful of map writes per unit and never span an await.
pub struct ProgressTracker {
    kind: WorkloadKind,
    started: Instant,
    state: Mutex<Report>,
}

impl ProgressTracker {
    /// Create a tracker expecting `target_units` units across `nodes`
    pub fn new(
        kind: WorkloadKind,
        name: impl Into<String>,
        target_units: usize,
        nodes: &[String],
    ) -> Self {
        let report = Report::new(name, target_units, nodes);
        tracing::debug!(
            kind = %kind,
            report = %report.report_name,
            target_units,
            nodes = nodes.len(),
            "Tracker created"
        );

        Self {
            kind,
            started: Instant::now(),
            state: Mutex::new(report),
        }
    }

    /// Workload kind this tracker summarizes
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// Units expected to reach the terminal milestone
    pub fn target_units(&self) -> usize {
        self.lock().num_instances
    }

    /// Time since the tracker was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn lock(&self) -> MutexGuard<'_, Report> {
        // A panicking writer leaves at most one unit half-recorded; keep going.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that the create call for `unit` returned successfully
    pub fn record_created(&self, unit: &str) {
        let elapsed = self.elapsed();
        self.lock().record(Milestone::Created, unit, elapsed);
    }

    /// Feed a batch of unit states
    ///
    /// Each implied milestone is recorded only if absent, and a unit's first
    /// observed placement bumps its node's distribution count once. Returns
    /// `true` iff every expected unit has reached the terminal milestone.
    pub fn observe(&self, snapshots: &[UnitSnapshot]) -> bool {
        let elapsed = self.elapsed();
        let mut report = self.lock();

        for snapshot in snapshots {
            let key = snapshot.key();
            for milestone in snapshot.state.milestones() {
                report.record_first(*milestone, &key, elapsed);
            }

            if snapshot.state.is_placed() {
                if let Some(node) = snapshot.node.as_deref().filter(|n| !n.is_empty()) {
                    report.record_placement(&key, node);
                }
            }

            if let UnitState::Failed { reason } = &snapshot.state {
                report.record_failure(&key, reason);
            }
        }

        report.terminal_count(self.kind) >= report.num_instances
    }

    /// Record a pushed completion
    ///
    /// Returns `true` if this call was the first completion seen for the unit.
    pub fn completed(&self, result: &TaskResult) -> bool {
        let elapsed = self.elapsed();
        let mut report = self.lock();

        let first = report.record_first(Milestone::Completed, &result.task_guid, elapsed);
        if first && result.failed {
            report.record_failure(&result.task_guid, &result.failure_reason);
        }
        if let Some(cell) = result.cell_id.as_deref().filter(|c| !c.is_empty()) {
            report.record_placement(&result.task_guid, cell);
        }

        first
    }

    /// Units that have reached the terminal milestone
    pub fn terminal_count(&self) -> usize {
        self.lock().terminal_count(self.kind)
    }

    /// Whether every expected unit has reached the terminal milestone
    pub fn is_satisfied(&self) -> bool {
        let report = self.lock();
        report.terminal_count(self.kind) >= report.num_instances
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Report {
        self.lock().clone()
    }

    /// Copy of the current state tagged with the workload kind
    pub fn record(&self) -> ReportRecord {
        ReportRecord::new(self.kind, self.snapshot())
    }

    /// Human-readable summary of the current state
    pub fn summary(&self) -> Summary {
        Summary::from_report(self.kind, &self.lock())
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.lock();
        f.debug_struct("ProgressTracker")
            .field("kind", &self.kind)
            .field("report_name", &report.report_name)
            .field("target_units", &report.num_instances)
            .field("terminal", &report.terminal_count(self.kind))
            .finish()
    }
}
