//! Orchestrator client seam
//!
//! The client is the only collaborator that talks to the cluster. It is
//! defined here so the driver, watchers and teardown can be exercised
//! against in-memory fakes; real HTTP clients live outside this crate.

use async_trait::async_trait;

use crate::workload::{UnitSnapshot, WorkloadSpec};

/// Operations the engine needs from the cluster orchestrator
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Submit a workload; returns the identity the orchestrator accepted
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<String, ClientError>;

    /// Identities of the worker nodes currently in the fleet
    async fn list_nodes(&self) -> Result<Vec<String>, ClientError>;

    /// Full snapshot of unit states within a namespace
    async fn snapshot_states(&self, namespace: &str) -> Result<Vec<UnitSnapshot>, ClientError>;

    /// Remove a workload
    async fn delete_workload(&self, identity: &str) -> Result<(), ClientError>;
}

/// Errors surfaced by an orchestrator client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The orchestrator refused the request
    #[error("rejected ({status}): {message}")]
    Rejected {
        /// Status code returned by the orchestrator
        status: u16,
        /// Error message
        message: String,
    },

    /// The identity is unknown to the orchestrator
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
