//! Completion watchers
//!
//! A watcher drives a scenario's `ProgressTracker` to its termination
//! predicate or gives up at a deadline.
//!
//! - `PollWatcher` fetches full state snapshots on an interval. Used for
//!   long-running processes, which are done once every replica runs.
//! - `PushWatcher` serves `POST /done` and counts distinct completion
//!   callbacks. Used for tasks, which report back when they finish.
//!
//! Both return a `WatchReport` when the target is reached and
//! `FezzikError::Timeout` when the deadline passes first. In either case the
//! tracker keeps whatever was observed, so a partial summary can still be
//! printed and persisted.

mod poll;
mod push;

pub use poll::PollWatcher;
pub use push::{PushWatcher, COMPLETION_PATH};

use std::time::Duration;

/// Lifecycle of a watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Fetching snapshots on an interval
    Polling,
    /// Accepting completion callbacks
    Listening,
    /// Every expected unit reached the terminal milestone
    Done,
    /// The deadline passed first
    TimedOut,
}

impl std::fmt::Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchState::Polling => f.write_str("polling"),
            WatchState::Listening => f.write_str("listening"),
            WatchState::Done => f.write_str("done"),
            WatchState::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Outcome of a finished watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchReport {
    /// Final state
    pub state: WatchState,
    /// Time spent watching
    pub elapsed: Duration,
    /// Units seen reaching the terminal milestone
    pub observed: usize,
    /// Units expected
    pub target: usize,
}

#[cfg(test)]
mod tests;
