//! Scenario cleanup
//!
//! Deletes every workload a scenario created and waits until the
//! orchestrator stops reporting units for the namespace.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{interval, timeout_at, Instant, MissedTickBehavior};

use crate::error::{FezzikError, Result};
use crate::traits::OrchestratorClient;

/// Delete `identities` and wait for `namespace` to drain
///
/// Delete failures are logged and do not stop the teardown, and neither do
/// failed snapshot fetches while draining. Returns the time until the
/// namespace was observed empty.
///
/// # Errors
///
/// `FezzikError::Timeout` if units are still reported at the deadline.
pub async fn teardown(
    client: Arc<dyn OrchestratorClient>,
    namespace: &str,
    identities: &[String],
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let started = Instant::now();
    let deadline = started + timeout;

    tracing::info!(namespace, workloads = identities.len(), "Tearing down");

    let deletes = identities.iter().map(|identity| {
        let client = Arc::clone(&client);
        async move { (identity, client.delete_workload(identity).await) }
    });
    let mut failed = 0usize;
    for (identity, outcome) in join_all(deletes).await {
        if let Err(e) = outcome {
            failed += 1;
            tracing::warn!(identity = %identity, error = %e, "Delete failed");
        }
    }

    let mut ticker = interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut remaining = 0usize;

    loop {
        if timeout_at(deadline, ticker.tick()).await.is_err() {
            break;
        }
        match timeout_at(deadline, client.snapshot_states(namespace)).await {
            Ok(Ok(units)) if units.is_empty() => {
                let elapsed = started.elapsed();
                tracing::info!(
                    namespace,
                    failed_deletes = failed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Teardown complete"
                );
                return Ok(elapsed);
            }
            Ok(Ok(units)) => {
                // Replicas share an identity; count workloads, not units.
                remaining = units
                    .iter()
                    .map(|unit| unit.identity.as_str())
                    .collect::<HashSet<_>>()
                    .len();
            }
            Ok(Err(e)) => tracing::warn!(namespace, error = %e, "Snapshot fetch failed during teardown"),
            Err(_) => break,
        }
    }

    tracing::warn!(namespace, remaining, "Teardown timed out");
    Err(FezzikError::Timeout {
        waited: started.elapsed(),
        observed: identities.len().saturating_sub(remaining),
        target: identities.len(),
    })
}
