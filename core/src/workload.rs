//! Workload units, specs and observed states

use serde::{Deserialize, Serialize};

use crate::report::Milestone;

/// The two kinds of workload a scenario can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// A desired long-running process with one or more replicas
    LongRunningProcess,
    /// A one-off task that runs to completion
    Task,
}

impl WorkloadKind {
    const LRP_TAG: &'static str = "LRP_REPORT";
    const TASK_TAG: &'static str = "TASK_REPORT";

    /// Milestone that ends observation for this kind
    pub fn terminal_milestone(self) -> Milestone {
        match self {
            WorkloadKind::LongRunningProcess => Milestone::Running,
            WorkloadKind::Task => Milestone::Completed,
        }
    }

    /// Whether units of this kind can end in a failed state
    pub fn tracks_failures(self) -> bool {
        matches!(self, WorkloadKind::Task)
    }

    /// Plural noun used in report titles
    pub fn unit_noun(self) -> &'static str {
        match self {
            WorkloadKind::LongRunningProcess => "Instances",
            WorkloadKind::Task => "Tasks",
        }
    }

    /// Discriminator line written ahead of a persisted report
    pub fn report_tag(self) -> &'static str {
        match self {
            WorkloadKind::LongRunningProcess => Self::LRP_TAG,
            WorkloadKind::Task => Self::TASK_TAG,
        }
    }

    /// Parse a discriminator line
    pub fn from_report_tag(tag: &str) -> Option<Self> {
        match tag {
            Self::LRP_TAG => Some(WorkloadKind::LongRunningProcess),
            Self::TASK_TAG => Some(WorkloadKind::Task),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadKind::LongRunningProcess => f.write_str("lrp"),
            WorkloadKind::Task => f.write_str("task"),
        }
    }
}

/// Key under which a unit is tracked
///
/// Replicas of one long-running process share an identity and are told
/// apart by index.
pub fn unit_key(identity: &str, index: Option<u32>) -> String {
    match index {
        Some(index) => format!("{identity}/{index}"),
        None => identity.to_string(),
    }
}

/// A create request handed to the orchestrator client
///
/// The identity is chosen by the caller so creation and observation can be
/// correlated without a server-generated id. The payload is opaque here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Caller-chosen identity (process guid or task guid)
    pub identity: String,
    /// Namespace (domain) the workload is created in
    pub namespace: String,
    /// Workload kind
    pub kind: WorkloadKind,
    /// Number of replicas (always 1 for tasks)
    pub instances: u32,
    /// Orchestrator-specific request body
    pub payload: serde_json::Value,
}

impl WorkloadSpec {
    /// Spec for a single task
    pub fn task(
        identity: impl Into<String>,
        namespace: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            identity: identity.into(),
            namespace: namespace.into(),
            kind: WorkloadKind::Task,
            instances: 1,
            payload,
        }
    }

    /// Spec for a long-running process with `instances` replicas
    pub fn long_running(
        identity: impl Into<String>,
        namespace: impl Into<String>,
        instances: u32,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            identity: identity.into(),
            namespace: namespace.into(),
            kind: WorkloadKind::LongRunningProcess,
            instances,
            payload,
        }
    }

    /// Keys of every unit this spec materializes once created
    pub fn unit_keys(&self) -> Vec<String> {
        match self.kind {
            WorkloadKind::Task => vec![unit_key(&self.identity, None)],
            WorkloadKind::LongRunningProcess => (0..self.instances)
                .map(|index| unit_key(&self.identity, Some(index)))
                .collect(),
        }
    }
}

/// Lifecycle state of a unit as reported by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UnitState {
    /// Known but not yet placed
    Unclaimed,
    /// Placed on a node, not yet running
    Claimed,
    /// Running on a node
    Running,
    /// Finished successfully
    Completed,
    /// Finished with a failure
    Failed {
        /// Failure reason reported by the orchestrator
        reason: String,
    },
    /// Crashed and awaiting restart
    Crashed,
}

impl UnitState {
    /// Milestones implied by being observed in this state
    pub fn milestones(&self) -> &'static [Milestone] {
        match self {
            UnitState::Unclaimed | UnitState::Crashed => &[],
            UnitState::Claimed => &[Milestone::Claimed],
            UnitState::Running => &[Milestone::Claimed, Milestone::Running],
            UnitState::Completed | UnitState::Failed { .. } => {
                &[Milestone::Claimed, Milestone::Running, Milestone::Completed]
            }
        }
    }

    /// Whether a unit in this state occupies a node
    pub fn is_placed(&self) -> bool {
        !self.milestones().is_empty()
    }
}

/// One unit's state in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Workload identity
    pub identity: String,
    /// Replica index, for long-running processes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Observed state
    #[serde(flatten)]
    pub state: UnitState,
    /// Node hosting the unit, once placed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl UnitSnapshot {
    /// Snapshot of an unindexed unit with no node
    pub fn new(identity: impl Into<String>, state: UnitState) -> Self {
        Self {
            identity: identity.into(),
            index: None,
            state,
            node: None,
        }
    }

    /// Set the replica index
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the hosting node
    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Tracker key for this unit
    pub fn key(&self) -> String {
        unit_key(&self.identity, self.index)
    }
}

/// Completion callback body posted by the orchestrator for a finished task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task identity
    pub task_guid: String,
    /// Whether the task failed
    #[serde(default)]
    pub failed: bool,
    /// Failure reason, empty on success
    #[serde(default)]
    pub failure_reason: String,
    /// Node the task ran on, when the orchestrator reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
}

impl TaskResult {
    /// A successful result
    pub fn succeeded(task_guid: impl Into<String>) -> Self {
        Self {
            task_guid: task_guid.into(),
            failed: false,
            failure_reason: String::new(),
            cell_id: None,
        }
    }

    /// A failed result
    pub fn failed(task_guid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            task_guid: task_guid.into(),
            failed: true,
            failure_reason: reason.into(),
            cell_id: None,
        }
    }

    /// Attach the node the task ran on
    pub fn on_cell(mut self, cell_id: impl Into<String>) -> Self {
        self.cell_id = Some(cell_id.into());
        self
    }
}
