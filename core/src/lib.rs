//! fezzik-core: Scaled submission and observation for cluster orchestrators
//!
//! This crate holds everything a fezzik scenario needs apart from the
//! report log and the command line:
//!
//! - Workload, unit state and completion types
//! - The `OrchestratorClient` trait the harness plugs a real client into
//! - A lock-guarded progress tracker with first-observation-wins semantics
//! - A bounded-concurrency submission driver
//! - Poll and push completion watchers
//! - Duration statistics and human-readable summaries
//! - Teardown of a scenario's workloads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod stats;
pub mod teardown;
pub mod tracker;
pub mod traits;
pub mod watcher;
pub mod workload;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, ScenarioConfig};
pub use driver::{SubmissionDriver, SubmissionDriverBuilder, SubmissionStats, SubmissionThrottle};
pub use error::{FezzikError, Result};
pub use report::{DurationMap, Milestone, Report, ReportRecord};
pub use stats::{DurationStats, StreamingStats};
pub use teardown::teardown;
pub use tracker::{OutcomeBreakdown, ProgressTracker, Summary};
pub use traits::{ClientError, OrchestratorClient};
pub use watcher::{PollWatcher, PushWatcher, WatchReport, WatchState, COMPLETION_PATH};
pub use workload::{unit_key, TaskResult, UnitSnapshot, UnitState, WorkloadKind, WorkloadSpec};
