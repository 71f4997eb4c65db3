//! Scenario harness
//!
//! One scenario is one scale factor: size the workload to the fleet, submit
//! it, watch it to completion, print and persist the summary, then delete
//! everything it created. The summary is printed and saved even when the
//! watcher gives up, so a slow run still leaves a partial report behind.

use std::sync::Arc;
use std::time::Duration;

use fezzik_core::driver::SubmissionDriverBuilder;
use fezzik_core::{
    teardown, ClientError, FezzikError, OrchestratorClient, PollWatcher, ProgressTracker,
    PushWatcher, ScenarioConfig, SubmissionStats, Summary, WatchReport, WorkloadKind, WorkloadSpec,
    COMPLETION_PATH,
};
use fezzik_storage::{ReportStore, StorageError};
use thiserror::Error;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::SuiteConfig;
use crate::workloads::WorkloadFactory;

/// Scenario failures
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Submission, observation or teardown failed
    #[error(transparent)]
    Core(#[from] FezzikError),

    /// The report could not be saved
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The orchestrator could not list its nodes
    #[error("orchestrator error: {0}")]
    Client(#[from] ClientError),

    /// Every create call was rejected
    #[error("no {kind} workload was created: {reason}")]
    NothingCreated {
        /// Workload kind
        kind: WorkloadKind,
        /// First rejection reason
        reason: String,
    },

    /// The scaled replica count does not fit a single create request
    #[error("{factor} instances per cell across {cells} cells exceeds {max} replicas")]
    TooManyInstances {
        /// Scale factor
        factor: usize,
        /// Fleet size
        cells: usize,
        /// Largest replica count a create request carries
        max: u32,
    },
}

impl ScenarioError {
    /// Whether the scenario ran out of time rather than failing outright
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScenarioError::Core(e) if e.is_timeout())
    }
}

/// What one successful scenario produced
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Report name
    pub name: String,
    /// Workload kind
    pub kind: WorkloadKind,
    /// Create call accounting
    pub submission: SubmissionStats,
    /// Watcher result
    pub watch: WatchReport,
    /// Printed summary
    pub summary: Summary,
    /// Time from the first delete until the namespace drained
    pub time_to_delete: Duration,
}

/// Every scenario of one suite run
#[derive(Debug, Default)]
pub struct SuiteOutcome {
    /// Scenarios that finished
    pub completed: Vec<ScenarioOutcome>,
    /// Scenarios that failed, by label
    pub failed: Vec<(String, ScenarioError)>,
}

impl SuiteOutcome {
    /// Whether every scenario finished
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs scenarios against one orchestrator
pub struct ScenarioRunner {
    client: Arc<dyn OrchestratorClient>,
    factory: Arc<dyn WorkloadFactory>,
    config: SuiteConfig,
    store: ReportStore,
}

impl ScenarioRunner {
    /// Runner saving reports to the configured report path
    pub fn new(
        client: Arc<dyn OrchestratorClient>,
        factory: Arc<dyn WorkloadFactory>,
        config: SuiteConfig,
    ) -> Self {
        let store = ReportStore::new(config.report_path.clone());
        Self {
            client,
            factory,
            config,
            store,
        }
    }

    /// Report log this runner appends to
    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Every configured scenario, long-running processes first
    ///
    /// A failed scenario is logged and the suite moves on.
    pub async fn run_suite(&self) -> SuiteOutcome {
        let mut outcome = SuiteOutcome::default();

        for &factor in &self.config.lrp_factors {
            let label = format!("lrp x{factor}");
            match self.run_lrp(factor).await {
                Ok(done) => outcome.completed.push(done),
                Err(e) => {
                    tracing::error!(scenario = %label, error = %e, "Scenario failed");
                    outcome.failed.push((label, e));
                }
            }
        }

        for &factor in &self.config.task_factors {
            let label = format!("tasks x{factor}");
            match self.run_tasks(factor).await {
                Ok(done) => outcome.completed.push(done),
                Err(e) => {
                    tracing::error!(scenario = %label, error = %e, "Scenario failed");
                    outcome.failed.push((label, e));
                }
            }
        }

        tracing::info!(
            completed = outcome.completed.len(),
            failed = outcome.failed.len(),
            "Suite finished"
        );
        outcome
    }

    /// Start `factor` instances per cell of one long-running process
    pub async fn run_lrp(&self, factor: usize) -> Result<ScenarioOutcome, ScenarioError> {
        let scenario = &self.config.lrp;
        let (nodes, cells) = self.fleet().await?;
        let replicas = factor
            .checked_mul(cells)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(ScenarioError::TooManyInstances {
                factor,
                cells,
                max: u32::MAX,
            })?;
        let instances = replicas as usize;
        let name = format!("Running {instances} Instances Across {cells} Cells");
        let guid = self.new_guid();

        tracing::info!(scenario = %name, guid = %guid, factor, "Starting scenario");

        let tracker = Arc::new(ProgressTracker::new(
            WorkloadKind::LongRunningProcess,
            name.clone(),
            instances,
            &nodes,
        ));
        let driver = self.driver(scenario, &tracker)?;

        let payload = self
            .factory
            .long_running(&guid, &self.config.domain, instances);
        let spec = WorkloadSpec::long_running(
            guid.clone(),
            self.config.domain.clone(),
            replicas,
            payload,
        );
        let submission = driver.submit_all(vec![spec]).await;

        let watched = match submission.failures.first() {
            Some((_, reason)) => Err(ScenarioError::NothingCreated {
                kind: WorkloadKind::LongRunningProcess,
                reason: reason.clone(),
            }),
            None => PollWatcher::from_config(
                Arc::clone(&self.client),
                Arc::clone(&tracker),
                self.config.domain.clone(),
                scenario,
            )
            .run()
            .await
            .map_err(ScenarioError::from),
        };

        self.finish(name, &tracker, submission, watched, vec![guid], scenario)
            .await
    }

    /// Run `factor` tasks per cell and wait for their completion callbacks
    pub async fn run_tasks(&self, factor: usize) -> Result<ScenarioOutcome, ScenarioError> {
        let scenario = &self.config.task;
        let (nodes, cells) = self.fleet().await?;
        let count = factor * cells;
        let name = format!("Running {count} Tasks Across {cells} Cells");
        let guid = self.new_guid();

        tracing::info!(scenario = %name, guid = %guid, factor, "Starting scenario");

        let tracker = Arc::new(ProgressTracker::new(
            WorkloadKind::Task,
            name.clone(),
            count,
            &nodes,
        ));
        let driver = self.driver(scenario, &tracker)?;
        let watcher = PushWatcher::from_config(Arc::clone(&tracker), scenario);

        let listener = TcpListener::bind(("0.0.0.0", 0))
            .await
            .map_err(FezzikError::from)?;
        let port = listener.local_addr().map_err(FezzikError::from)?.port();
        let callback_url = format!(
            "http://{}:{}{}",
            self.config.callback_host, port, COMPLETION_PATH
        );
        let server = {
            let watcher = watcher.clone();
            tokio::spawn(async move { watcher.serve(listener).await })
        };

        let specs: Vec<WorkloadSpec> = (0..count)
            .map(|i| {
                let identity = format!("{guid}-{i}");
                let payload = self
                    .factory
                    .task(&identity, &self.config.domain, &callback_url);
                WorkloadSpec::task(identity, self.config.domain.clone(), payload)
            })
            .collect();
        let identities: Vec<String> = specs.iter().map(|s| s.identity.clone()).collect();

        let submission = driver.submit_all(specs).await;
        if submission.failed > 0 {
            // Rejected tasks never call back.
            watcher.set_expected(submission.succeeded);
        }

        let watched = if count > 0 && submission.succeeded == 0 {
            Err(ScenarioError::NothingCreated {
                kind: WorkloadKind::Task,
                reason: submission
                    .failures
                    .first()
                    .map(|(_, reason)| reason.clone())
                    .unwrap_or_default(),
            })
        } else {
            watcher.wait().await.map_err(ScenarioError::from)
        };

        watcher.close();
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Completion endpoint failed"),
            Err(e) => tracing::warn!(error = %e, "Completion endpoint task panicked"),
        }

        self.finish(name, &tracker, submission, watched, identities, scenario)
            .await
    }

    /// Summarize, persist and tear down, then report the watch result
    async fn finish(
        &self,
        name: String,
        tracker: &ProgressTracker,
        submission: SubmissionStats,
        watched: Result<WatchReport, ScenarioError>,
        identities: Vec<String>,
        scenario: &ScenarioConfig,
    ) -> Result<ScenarioOutcome, ScenarioError> {
        let summary = tracker.summary();
        println!("{summary}");
        let saved = self.store.append(&tracker.record());
        if let Err(e) = &saved {
            tracing::error!(scenario = %name, error = %e, "Failed to save report");
        }

        let deleted = teardown(
            Arc::clone(&self.client),
            &self.config.domain,
            &identities,
            scenario.teardown_timeout,
            scenario.poll_interval,
        )
        .await;
        if let Ok(elapsed) = &deleted {
            println!("Time to delete: {elapsed:?}");
        }

        saved?;
        let watch = watched?;
        let time_to_delete = deleted?;

        tracing::info!(
            scenario = %name,
            observed = watch.observed,
            target = watch.target,
            elapsed_ms = watch.elapsed.as_millis() as u64,
            "Scenario finished"
        );

        Ok(ScenarioOutcome {
            name,
            kind: tracker.kind(),
            submission,
            watch,
            summary,
            time_to_delete,
        })
    }

    async fn fleet(&self) -> Result<(Vec<String>, usize), ScenarioError> {
        let nodes = self.client.list_nodes().await?;
        let cells = self.config.num_cells.unwrap_or(nodes.len());
        tracing::debug!(listed = nodes.len(), cells, "Fleet listed");
        Ok((nodes, cells))
    }

    fn driver(
        &self,
        scenario: &ScenarioConfig,
        tracker: &Arc<ProgressTracker>,
    ) -> Result<fezzik_core::SubmissionDriver, ScenarioError> {
        let driver = SubmissionDriverBuilder::new()
            .config(scenario)
            .client(Arc::clone(&self.client))
            .tracker(Arc::clone(tracker))
            .build()?;
        Ok(driver)
    }

    fn new_guid(&self) -> String {
        format!("{}-{}", self.config.domain, Uuid::new_v4())
    }
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("domain", &self.config.domain)
            .field("store", &self.store)
            .finish()
    }
}
