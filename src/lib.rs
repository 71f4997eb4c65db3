//! fezzik: Scaled submission-and-observation suites for cluster orchestrators
//!
//! The library half of the `fezzik` binary. It wires the pieces from
//! `fezzik-core` and `fezzik-storage` into runnable scenarios:
//!
//! - `SuiteConfig`: scale factors, namespace, deadlines and report location
//! - `ScenarioRunner`: one scenario per scale factor, for long-running
//!   processes and for tasks
//! - `WorkloadFactory`: request bodies for the submitted workloads
//!
//! Plug in an `OrchestratorClient` for the target cluster and call
//! `ScenarioRunner::run_suite`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod scenario;
pub mod workloads;

pub use config::{SuiteConfig, SuiteConfigError};
pub use scenario::{ScenarioError, ScenarioOutcome, ScenarioRunner, SuiteOutcome};
pub use workloads::{LightweightWorkloads, WorkloadFactory};
