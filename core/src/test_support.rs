//! In-memory orchestrator used by the unit tests

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::traits::{ClientError, OrchestratorClient};
use crate::workload::{UnitSnapshot, WorkloadSpec};

/// Scriptable fake orchestrator
///
/// Snapshots are served from a queue; once one entry is left it is repeated.
pub struct FakeOrchestrator {
    nodes: Vec<String>,
    create_delay: Option<Duration>,
    failing: HashSet<String>,
    snapshots: Mutex<VecDeque<Result<Vec<UnitSnapshot>, String>>>,
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub snapshot_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeOrchestrator {
    pub fn new(nodes: &[&str]) -> Self {
        Self {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            create_delay: None,
            failing: HashSet::new(),
            snapshots: Mutex::new(VecDeque::new()),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            snapshot_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn failing_on(mut self, identity: &str) -> Self {
        self.failing.insert(identity.to_string());
        self
    }

    pub fn push_snapshot(&self, snapshot: Vec<UnitSnapshot>) {
        self.snapshots.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_snapshot_error(&self, message: &str) {
        self.snapshots
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrchestratorClient for FakeOrchestrator {
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<String, ClientError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&spec.identity) {
            return Err(ClientError::Rejected {
                status: 503,
                message: "auctioneer unavailable".into(),
            });
        }

        self.created.lock().unwrap().push(spec.identity.clone());
        Ok(spec.identity.clone())
    }

    async fn list_nodes(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.nodes.clone())
    }

    async fn snapshot_states(&self, _namespace: &str) -> Result<Vec<UnitSnapshot>, ClientError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);

        let mut queue = self.snapshots.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match next {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(ClientError::Transport(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_workload(&self, identity: &str) -> Result<(), ClientError> {
        self.deleted.lock().unwrap().push(identity.to_string());
        if self.failing.contains(identity) {
            return Err(ClientError::NotFound(identity.to_string()));
        }
        Ok(())
    }
}
