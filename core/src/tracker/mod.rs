//! Progress tracking for one scenario
//!
//! A `ProgressTracker` records, for every unit, the first time each
//! lifecycle milestone was observed. Submission tasks, the poll loop and
//! completion handlers all write through one lock, so a tracker can be
//! shared behind an `Arc` by every activity in a scenario.
//!
//! # Example
//!
//! ```ignore
//! use fezzik_core::{ProgressTracker, WorkloadKind};
//!
//! let tracker = ProgressTracker::new(
//!     WorkloadKind::LongRunningProcess,
//!     "Running 50 Instances Across 10 Cells",
//!     50,
//!     &cells,
//! );
//!
//! while !tracker.observe(&client.snapshot_states(&guid).await?) {
//!     tokio::time::sleep(Duration::from_millis(200)).await;
//! }
//! println!("{}", tracker.summary());
//! ```

mod progress;
mod summary;

pub use progress::ProgressTracker;
pub use summary::{OutcomeBreakdown, Summary};

#[cfg(test)]
mod tests;
