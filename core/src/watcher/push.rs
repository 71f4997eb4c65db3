//! Callback-driven completion watcher

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

use crate::config::ScenarioConfig;
use crate::error::{FezzikError, Result};
use crate::tracker::ProgressTracker;
use crate::workload::TaskResult;

use super::{WatchReport, WatchState};

/// Route the orchestrator posts completion callbacks to
pub const COMPLETION_PATH: &str = "/done";

struct PushState {
    tracker: Arc<ProgressTracker>,
    expected: AtomicUsize,
    received: AtomicUsize,
    progress: Notify,
    failure: Mutex<Option<String>>,
    closed: AtomicBool,
    shutdown: Notify,
}

impl PushState {
    fn is_done(&self) -> bool {
        self.received.load(Ordering::SeqCst) >= self.expected.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<String> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fail(&self, reason: String) {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(reason);
        }
        drop(failure);
        self.progress.notify_waiters();
    }

    async fn closed(&self) {
        loop {
            let notified = self.shutdown.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// Counts distinct task completions pushed to `POST /done`
///
/// Construct it before submitting so no callback can arrive ahead of the
/// endpoint. Cloning shares the same counters.
#[derive(Clone)]
pub struct PushWatcher {
    state: Arc<PushState>,
    timeout: Duration,
}

impl PushWatcher {
    /// Watcher expecting one completion per tracked unit
    pub fn new(tracker: Arc<ProgressTracker>) -> Self {
        let expected = tracker.target_units();
        Self {
            state: Arc::new(PushState {
                tracker,
                expected: AtomicUsize::new(expected),
                received: AtomicUsize::new(0),
                progress: Notify::new(),
                failure: Mutex::new(None),
                closed: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            timeout: ScenarioConfig::default().timeout,
        }
    }

    /// Watcher using a scenario's timeout
    pub fn from_config(tracker: Arc<ProgressTracker>, config: &ScenarioConfig) -> Self {
        Self::new(tracker).with_timeout(config.timeout)
    }

    /// Set the overall deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Change how many distinct completions end the wait
    ///
    /// Lowered by the harness when some creates were rejected and their
    /// callbacks will never arrive.
    pub fn set_expected(&self, expected: usize) {
        self.state.expected.store(expected, Ordering::SeqCst);
        self.state.progress.notify_waiters();
    }

    /// Distinct completions required
    pub fn expected(&self) -> usize {
        self.state.expected.load(Ordering::SeqCst)
    }

    /// Distinct completions received so far
    pub fn received(&self) -> usize {
        self.state.received.load(Ordering::SeqCst)
    }

    /// Current watcher state
    pub fn state(&self) -> WatchState {
        if self.state.is_done() {
            WatchState::Done
        } else {
            WatchState::Listening
        }
    }

    /// Router exposing the completion endpoint
    pub fn router(&self) -> Router {
        Router::new()
            .route(COMPLETION_PATH, post(handle_done))
            .with_state(Arc::clone(&self.state))
    }

    /// Serve the completion endpoint until `close` is called
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(state = %WatchState::Listening, %addr, "Completion endpoint up");

        let state = Arc::clone(&self.state);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { state.closed().await })
            .await?;

        tracing::debug!(%addr, "Completion endpoint stopped");
        Ok(())
    }

    /// Stop a running `serve`
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.shutdown.notify_waiters();
    }

    /// Wait for every expected completion
    ///
    /// # Errors
    ///
    /// `FezzikError::Notification` once an undecodable callback arrives and
    /// `FezzikError::Timeout` when the deadline passes first.
    pub async fn wait(&self) -> Result<WatchReport> {
        let started = Instant::now();
        let deadline = started + self.timeout;

        loop {
            let notified = self.state.progress.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(reason) = self.state.failure() {
                return Err(FezzikError::notification(reason));
            }
            if self.state.is_done() {
                let report = WatchReport {
                    state: WatchState::Done,
                    elapsed: started.elapsed(),
                    observed: self.received(),
                    target: self.expected(),
                };
                tracing::info!(
                    state = %report.state,
                    observed = report.observed,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "All tasks completed"
                );
                return Ok(report);
            }

            if timeout_at(deadline, notified).await.is_err() {
                let observed = self.received();
                let target = self.expected();
                tracing::warn!(
                    state = %WatchState::TimedOut,
                    observed,
                    target,
                    "Gave up waiting for task completions"
                );
                return Err(FezzikError::Timeout {
                    waited: started.elapsed(),
                    observed,
                    target,
                });
            }
        }
    }
}

async fn handle_done(State(state): State<Arc<PushState>>, body: Bytes) -> StatusCode {
    let result: TaskResult = match serde_json::from_slice(&body) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable completion callback");
            state.fail(e.to_string());
            return StatusCode::BAD_REQUEST;
        }
    };

    if state.tracker.completed(&result) {
        let received = state.received.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            task = %result.task_guid,
            failed = result.failed,
            received,
            "Task completed"
        );
        if state.is_done() {
            state.progress.notify_waiters();
        }
    } else {
        tracing::debug!(task = %result.task_guid, "Duplicate completion ignored");
    }

    StatusCode::OK
}

impl std::fmt::Debug for PushWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushWatcher")
            .field("expected", &self.expected())
            .field("received", &self.received())
            .field("timeout", &self.timeout)
            .finish()
    }
}
