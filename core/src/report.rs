//! Serializable tracker state
//!
//! A `Report` is everything a progress tracker knows about one scenario.
//! It is the form persisted to the report log and the form replayed from it,
//! so its JSON field names are stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::tracker::Summary;
use crate::workload::WorkloadKind;

/// Lifecycle milestone tracked with a first-seen timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Milestone {
    /// The create call returned successfully
    Created,
    /// The unit was placed on a node
    Claimed,
    /// The unit was running
    Running,
    /// The unit finished (successfully or not)
    Completed,
}

impl Milestone {
    /// Every milestone, in lifecycle order
    pub const ALL: [Milestone; 4] = [
        Milestone::Created,
        Milestone::Claimed,
        Milestone::Running,
        Milestone::Completed,
    ];

    /// Heading used when printing stats for this milestone
    pub fn stats_label(self) -> &'static str {
        match self {
            Milestone::Created => "Creation time stats (in seconds)",
            Milestone::Claimed => "Claim time stats (in seconds)",
            Milestone::Running => "Running time stats (in seconds)",
            Milestone::Completed => "Completion time stats (in seconds)",
        }
    }
}

/// Map from unit key to elapsed time since the report started
pub type DurationMap = BTreeMap<String, Duration>;

/// Full state of one scenario's progress tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    /// Wall-clock time the tracker was created
    pub report_time: DateTime<Utc>,
    /// Descriptive label
    pub report_name: String,
    /// Fleet size at construction
    pub num_cells: usize,
    /// Units expected to reach the terminal milestone
    pub num_instances: usize,
    /// First-seen creation per unit
    #[serde(with = "duration_nanos")]
    pub time_to_create: DurationMap,
    /// First-seen placement per unit
    #[serde(with = "duration_nanos")]
    pub time_to_claimed: DurationMap,
    /// First-seen running per unit
    #[serde(with = "duration_nanos")]
    pub time_to_running: DurationMap,
    /// First-seen completion per unit
    #[serde(with = "duration_nanos")]
    pub time_to_complete: DurationMap,
    /// Node each unit was first observed placed on
    pub placements: BTreeMap<String, String>,
    /// Units first observed placed per node
    pub distribution: BTreeMap<String, usize>,
    /// Failure reason per failed unit
    pub failures: BTreeMap<String, String>,
}

impl Report {
    /// Empty report with a zero entry for every known node
    pub fn new(name: impl Into<String>, num_instances: usize, nodes: &[String]) -> Self {
        Self {
            report_time: Utc::now(),
            report_name: name.into(),
            num_cells: nodes.len(),
            num_instances,
            time_to_create: DurationMap::new(),
            time_to_claimed: DurationMap::new(),
            time_to_running: DurationMap::new(),
            time_to_complete: DurationMap::new(),
            placements: BTreeMap::new(),
            distribution: nodes.iter().map(|node| (node.clone(), 0)).collect(),
            failures: BTreeMap::new(),
        }
    }

    /// Durations recorded for a milestone
    pub fn durations(&self, milestone: Milestone) -> &DurationMap {
        match milestone {
            Milestone::Created => &self.time_to_create,
            Milestone::Claimed => &self.time_to_claimed,
            Milestone::Running => &self.time_to_running,
            Milestone::Completed => &self.time_to_complete,
        }
    }

    fn durations_mut(&mut self, milestone: Milestone) -> &mut DurationMap {
        match milestone {
            Milestone::Created => &mut self.time_to_create,
            Milestone::Claimed => &mut self.time_to_claimed,
            Milestone::Running => &mut self.time_to_running,
            Milestone::Completed => &mut self.time_to_complete,
        }
    }

    /// Record `elapsed` for `unit` unless a value is already present
    ///
    /// Returns `true` if this call wrote the value.
    pub fn record_first(&mut self, milestone: Milestone, unit: &str, elapsed: Duration) -> bool {
        let durations = self.durations_mut(milestone);
        if durations.contains_key(unit) {
            return false;
        }
        durations.insert(unit.to_string(), elapsed);
        true
    }

    /// Record `elapsed` for `unit`, replacing any earlier value
    pub fn record(&mut self, milestone: Milestone, unit: &str, elapsed: Duration) {
        self.durations_mut(milestone)
            .insert(unit.to_string(), elapsed);
    }

    /// Record the first node `unit` was seen on
    ///
    /// The node's distribution count grows only the first time a unit is
    /// placed. Returns `true` if this call recorded the placement.
    pub fn record_placement(&mut self, unit: &str, node: &str) -> bool {
        if self.placements.contains_key(unit) {
            return false;
        }
        self.placements.insert(unit.to_string(), node.to_string());
        *self.distribution.entry(node.to_string()).or_insert(0) += 1;
        true
    }

    /// Record a failure reason unless one is already present
    pub fn record_failure(&mut self, unit: &str, reason: &str) {
        self.failures
            .entry(unit.to_string())
            .or_insert_with(|| reason.to_string());
    }

    /// Units that reached the terminal milestone for `kind`
    pub fn terminal_count(&self, kind: WorkloadKind) -> usize {
        self.durations(kind.terminal_milestone()).len()
    }
}

/// A report tagged with the workload kind it summarizes
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    /// Workload kind
    pub kind: WorkloadKind,
    /// Tracker state
    pub report: Report,
}

impl ReportRecord {
    /// Tag a report
    pub fn new(kind: WorkloadKind, report: Report) -> Self {
        Self { kind, report }
    }

    /// Human-readable summary of the report
    pub fn summary(&self) -> Summary {
        Summary::from_report(self.kind, &self.report)
    }
}

/// Serialize duration maps as integer nanoseconds per key
mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let nanos: BTreeMap<&str, u64> = map
            .iter()
            .map(|(key, value)| {
                let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
                (key.as_str(), nanos)
            })
            .collect();
        nanos.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Duration>, D::Error> {
        let nanos = BTreeMap::<String, u64>::deserialize(deserializer)?;
        Ok(nanos
            .into_iter()
            .map(|(key, value)| (key, Duration::from_nanos(value)))
            .collect())
    }
}
