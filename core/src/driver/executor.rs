//! Submission fan-out

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::tracker::ProgressTracker;
use crate::traits::OrchestratorClient;
use crate::workload::WorkloadSpec;

use super::stats::SubmissionStats;
use super::throttle::SubmissionThrottle;

/// Submits a batch of workloads with bounded parallelism
pub struct SubmissionDriver {
    /// Orchestrator client (shared across submission tasks)
    client: Arc<dyn OrchestratorClient>,

    /// Tracker receiving creation timestamps
    tracker: Arc<ProgressTracker>,

    /// Concurrency limiter
    semaphore: Arc<Semaphore>,

    /// Creates-per-second limiter
    throttle: Arc<SubmissionThrottle>,

    concurrency: usize,
}

impl SubmissionDriver {
    /// Create a new driver
    ///
    /// Use `SubmissionDriverBuilder` for validated construction.
    pub fn new(
        client: Arc<dyn OrchestratorClient>,
        tracker: Arc<ProgressTracker>,
        concurrency: usize,
        throttle: SubmissionThrottle,
    ) -> Self {
        Self {
            client,
            tracker,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            throttle: Arc::new(throttle),
            concurrency,
        }
    }

    /// Maximum number of create calls in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Attempt every submission and return once all have finished
    ///
    /// Failures are logged and counted; they never abort the batch.
    pub async fn submit_all(&self, specs: Vec<WorkloadSpec>) -> SubmissionStats {
        let mut stats = SubmissionStats::new();
        stats.start();

        tracing::info!(
            workloads = specs.len(),
            concurrency = self.concurrency,
            rate_limit = ?self.throttle.creates_per_second(),
            "Submitting workloads"
        );

        let mut identities = Vec::with_capacity(specs.len());
        let mut handles = Vec::with_capacity(specs.len());
        for spec in specs {
            identities.push(spec.identity.clone());

            let client = Arc::clone(&self.client);
            let tracker = Arc::clone(&self.tracker);
            let semaphore = Arc::clone(&self.semaphore);
            let throttle = Arc::clone(&self.throttle);

            handles.push(tokio::spawn(submit_one(
                client, tracker, semaphore, throttle, spec,
            )));
        }

        for (identity, joined) in identities.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(Ok(())) => stats.record_success(),
                Ok(Err(reason)) => {
                    tracing::warn!(identity = %identity, error = %reason, "Workload creation failed");
                    stats.record_failure(identity, reason);
                }
                Err(e) => {
                    tracing::error!(identity = %identity, error = %e, "Submission task panicked");
                    stats.record_failure(identity, e.to_string());
                }
            }
        }

        stats.stop();
        tracing::info!(
            attempted = stats.attempted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            success_rate = stats.success_rate(),
            creates_per_second = stats.creates_per_second(),
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Submission finished"
        );

        stats
    }
}

/// Run one create call under the throttle and concurrency bound
async fn submit_one(
    client: Arc<dyn OrchestratorClient>,
    tracker: Arc<ProgressTracker>,
    semaphore: Arc<Semaphore>,
    throttle: Arc<SubmissionThrottle>,
    spec: WorkloadSpec,
) -> Result<(), String> {
    throttle.acquire().await;
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|_| "submission pool closed".to_string())?;

    let accepted = client
        .create_workload(&spec)
        .await
        .map_err(|e| e.to_string())?;

    // Stamped per call, as soon as this create returns.
    for unit in spec.unit_keys() {
        tracker.record_created(&unit);
    }
    tracing::debug!(identity = %accepted, "Workload created");

    Ok(())
}

impl std::fmt::Debug for SubmissionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionDriver")
            .field("concurrency", &self.concurrency)
            .field("throttle", &self.throttle)
            .field("tracker", &self.tracker)
            .finish()
    }
}
