//! Human-readable scenario summaries

use std::fmt;

use crate::report::{Milestone, Report};
use crate::stats::DurationStats;
use crate::workload::WorkloadKind;

/// Success/failure accounting relative to the requested unit count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeBreakdown {
    /// Units requested (the tracker's target)
    pub requested: usize,
    /// Units that completed without failure
    pub succeeded: usize,
    /// Units that completed with a failure
    pub failed: usize,
    /// Units never observed completing
    pub never_completed: usize,
    /// Failure reason per failed unit, sorted by unit
    pub failures: Vec<(String, String)>,
}

impl OutcomeBreakdown {
    fn from_report(report: &Report) -> Self {
        let requested = report.num_instances;
        let completed = report.time_to_complete.len();
        let failed = report.failures.len();

        Self {
            requested,
            succeeded: completed.saturating_sub(failed),
            failed,
            never_completed: requested.saturating_sub(completed),
            failures: report
                .failures
                .iter()
                .map(|(unit, reason)| (unit.clone(), reason.clone()))
                .collect(),
        }
    }

    /// Percentage of requested units that succeeded
    pub fn percent_succeeded(&self) -> f64 {
        percent(self.succeeded, self.requested)
    }

    /// Percentage of requested units that failed
    pub fn percent_failed(&self) -> f64 {
        percent(self.failed, self.requested)
    }

    /// Percentage of requested units never seen completing
    pub fn percent_never_completed(&self) -> f64 {
        percent(self.never_completed, self.requested)
    }
}

/// Zero requested units is a valid scenario and reports 0%.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Read-only summary of a tracker or a replayed report
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Report title
    pub title: String,
    /// Workload kind
    pub kind: WorkloadKind,
    /// Outcome accounting, for kinds that can fail
    pub outcome: Option<OutcomeBreakdown>,
    /// Stats per milestone relevant to the kind
    pub timings: Vec<(Milestone, DurationStats)>,
    /// Units per node, sorted by node identity
    pub distribution: Vec<(String, usize)>,
}

impl Summary {
    /// Summarize a report
    pub fn from_report(kind: WorkloadKind, report: &Report) -> Self {
        let milestones: &[Milestone] = match kind {
            WorkloadKind::LongRunningProcess => {
                &[Milestone::Created, Milestone::Claimed, Milestone::Running]
            }
            WorkloadKind::Task => &[Milestone::Created, Milestone::Completed],
        };

        Self {
            title: report.report_name.clone(),
            kind,
            outcome: kind
                .tracks_failures()
                .then(|| OutcomeBreakdown::from_report(report)),
            timings: milestones
                .iter()
                .map(|m| (*m, DurationStats::from_durations(report.durations(*m).values())))
                .collect(),
            distribution: report
                .distribution
                .iter()
                .map(|(node, count)| (node.clone(), *count))
                .collect(),
        }
    }

    /// Stats for one milestone, if the summary includes it
    pub fn timing(&self, milestone: Milestone) -> Option<&DurationStats> {
        self.timings
            .iter()
            .find(|(m, _)| *m == milestone)
            .map(|(_, stats)| stats)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(self.title.len()))?;
        writeln!(f, "{}", self.title)?;

        if let Some(outcome) = &self.outcome {
            writeln!(f, "Of {} {}:", outcome.requested, self.kind.unit_noun())?;
            writeln!(
                f,
                "  {} ({:.2}%) Succeeded",
                outcome.succeeded,
                outcome.percent_succeeded()
            )?;
            if outcome.failed > 0 {
                writeln!(
                    f,
                    "  {} ({:.2}%) Failed",
                    outcome.failed,
                    outcome.percent_failed()
                )?;
                for (unit, reason) in &outcome.failures {
                    writeln!(f, "    {unit}: {reason}")?;
                }
            }
            if outcome.never_completed > 0 {
                writeln!(
                    f,
                    "  {} ({:.2}%) Never Completed",
                    outcome.never_completed,
                    outcome.percent_never_completed()
                )?;
            }
        }

        for (milestone, stats) in &self.timings {
            writeln!(f, "{}", milestone.stats_label())?;
            writeln!(f, "  {stats}")?;
        }

        if !self.distribution.is_empty() {
            writeln!(f, "Distribution:")?;
            for (node, count) in &self.distribution {
                writeln!(f, "  {:>12} {}", node, "+".repeat(*count))?;
            }
        }

        Ok(())
    }
}
