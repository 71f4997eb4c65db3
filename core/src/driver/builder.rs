//! Builder pattern for SubmissionDriver construction

use std::sync::Arc;

use crate::config::ScenarioConfig;
use crate::error::{FezzikError, Result};
use crate::tracker::ProgressTracker;
use crate::traits::OrchestratorClient;

use super::executor::SubmissionDriver;
use super::throttle::SubmissionThrottle;

/// Builder for a `SubmissionDriver`
///
/// # Example
///
/// ```ignore
/// let driver = SubmissionDriverBuilder::new()
///     .config(&scenario_config)
///     .client(client)
///     .tracker(tracker)
///     .build()?;
/// ```
pub struct SubmissionDriverBuilder {
    client: Option<Arc<dyn OrchestratorClient>>,
    tracker: Option<Arc<ProgressTracker>>,
    concurrency: usize,
    rate_limit: Option<f64>,
}

impl SubmissionDriverBuilder {
    /// Create a builder with the default scenario concurrency
    pub fn new() -> Self {
        Self {
            client: None,
            tracker: None,
            concurrency: ScenarioConfig::default().concurrency,
            rate_limit: None,
        }
    }

    /// Take concurrency and rate limit from a scenario config
    pub fn config(mut self, config: &ScenarioConfig) -> Self {
        self.concurrency = config.concurrency;
        self.rate_limit = config.rate_limit;
        self
    }

    /// Set the orchestrator client
    pub fn client(mut self, client: Arc<dyn OrchestratorClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the tracker that receives creation timestamps
    pub fn tracker(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Set the maximum number of create calls in flight
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the creates-per-second limit
    pub fn rate_limit(mut self, rps: Option<f64>) -> Self {
        self.rate_limit = rps;
        self
    }

    /// Build the driver
    ///
    /// # Errors
    ///
    /// Returns an error if the client or tracker is missing or the
    /// concurrency is zero.
    pub fn build(self) -> Result<SubmissionDriver> {
        let client = self
            .client
            .ok_or_else(|| FezzikError::missing_config("client"))?;
        let tracker = self
            .tracker
            .ok_or_else(|| FezzikError::missing_config("tracker"))?;

        if self.concurrency == 0 {
            return Err(FezzikError::config("concurrency must be at least 1"));
        }

        Ok(SubmissionDriver::new(
            client,
            tracker,
            self.concurrency,
            SubmissionThrottle::new(self.rate_limit),
        ))
    }
}

impl Default for SubmissionDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
