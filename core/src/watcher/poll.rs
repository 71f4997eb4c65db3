//! Interval-driven snapshot watcher

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, timeout_at, Instant, MissedTickBehavior};

use crate::config::ScenarioConfig;
use crate::error::{FezzikError, Result};
use crate::tracker::ProgressTracker;
use crate::traits::OrchestratorClient;

use super::{WatchReport, WatchState};

/// Polls the orchestrator until every expected unit is running
pub struct PollWatcher {
    client: Arc<dyn OrchestratorClient>,
    tracker: Arc<ProgressTracker>,
    namespace: String,
    interval: Duration,
    timeout: Duration,
}

impl PollWatcher {
    /// Watcher with the default scenario interval and timeout
    pub fn new(
        client: Arc<dyn OrchestratorClient>,
        tracker: Arc<ProgressTracker>,
        namespace: impl Into<String>,
    ) -> Self {
        let defaults = ScenarioConfig::default();
        Self {
            client,
            tracker,
            namespace: namespace.into(),
            interval: defaults.poll_interval,
            timeout: defaults.timeout,
        }
    }

    /// Watcher using a scenario's interval and timeout
    pub fn from_config(
        client: Arc<dyn OrchestratorClient>,
        tracker: Arc<ProgressTracker>,
        namespace: impl Into<String>,
        config: &ScenarioConfig,
    ) -> Self {
        Self::new(client, tracker, namespace)
            .with_interval(config.poll_interval)
            .with_timeout(config.timeout)
    }

    /// Set the time between snapshots
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Poll until the tracker is satisfied or the deadline passes
    ///
    /// # Errors
    ///
    /// `FezzikError::Observation` on the first failed fetch and
    /// `FezzikError::Timeout` when the deadline passes first.
    pub async fn run(&self) -> Result<WatchReport> {
        let started = Instant::now();
        let deadline = started + self.timeout;

        let mut ticker = interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            state = %WatchState::Polling,
            namespace = %self.namespace,
            target = self.tracker.target_units(),
            interval_ms = self.interval.as_millis() as u64,
            "Waiting for units to run"
        );

        let mut polls = 0u64;
        loop {
            if timeout_at(deadline, ticker.tick()).await.is_err() {
                return Err(self.timed_out(started));
            }

            let fetched = timeout_at(deadline, self.client.snapshot_states(&self.namespace)).await;
            let snapshot = match fetched {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(e)) => {
                    tracing::error!(namespace = %self.namespace, error = %e, "Snapshot fetch failed");
                    return Err(FezzikError::observation(e.to_string()));
                }
                Err(_) => return Err(self.timed_out(started)),
            };
            polls += 1;

            if self.tracker.observe(&snapshot) {
                let report = WatchReport {
                    state: WatchState::Done,
                    elapsed: started.elapsed(),
                    observed: self.tracker.terminal_count(),
                    target: self.tracker.target_units(),
                };
                tracing::info!(
                    state = %report.state,
                    polls,
                    observed = report.observed,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "All units running"
                );
                return Ok(report);
            }

            tracing::debug!(
                polls,
                units = snapshot.len(),
                observed = self.tracker.terminal_count(),
                "Snapshot observed"
            );
        }
    }

    fn timed_out(&self, started: Instant) -> FezzikError {
        let observed = self.tracker.terminal_count();
        let target = self.tracker.target_units();
        tracing::warn!(
            state = %WatchState::TimedOut,
            observed,
            target,
            "Gave up waiting for units to run"
        );
        FezzikError::Timeout {
            waited: started.elapsed(),
            observed,
            target,
        }
    }
}

impl std::fmt::Debug for PollWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollWatcher")
            .field("namespace", &self.namespace)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}
