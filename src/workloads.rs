//! Request bodies for the workloads a suite submits

use serde_json::{json, Value};

/// Builds the orchestrator-specific body of each create request
pub trait WorkloadFactory: Send + Sync {
    /// Body for a long-running process with `instances` replicas
    fn long_running(&self, guid: &str, domain: &str, instances: usize) -> Value;

    /// Body for a task that reports completion to `callback_url`
    fn task(&self, guid: &str, domain: &str, callback_url: &str) -> Value;
}

/// Small workloads with no downloads or uploads
///
/// Tasks echo their guid into a result file; long-running processes run a
/// tiny HTTP server on port 8080 and are monitored with `nc`.
#[derive(Debug, Clone)]
pub struct LightweightWorkloads {
    root_fs: String,
}

impl LightweightWorkloads {
    /// Workloads on the given root filesystem
    pub fn new(root_fs: impl Into<String>) -> Self {
        Self {
            root_fs: root_fs.into(),
        }
    }
}

impl Default for LightweightWorkloads {
    fn default() -> Self {
        Self::new("preloaded:cflinuxfs2")
    }
}

impl WorkloadFactory for LightweightWorkloads {
    fn long_running(&self, guid: &str, domain: &str, instances: usize) -> Value {
        json!({
            "process_guid": guid,
            "domain": domain,
            "rootfs": self.root_fs,
            "instances": instances,
            "cached_dependencies": [{
                "from": "http://onsi-public.s3.amazonaws.com/grace.tar.gz",
                "to": "/home/vcap/grace",
                "cache_key": "grace",
            }],
            "action": { "run": { "path": "/home/vcap/grace/grace", "user": "vcap" } },
            "monitor": {
                "run": { "path": "nc", "args": ["-z", "127.0.0.1", "8080"], "user": "vcap" }
            },
            "ports": [8080],
            "disk_mb": 128,
            "memory_mb": 64,
        })
    }

    fn task(&self, guid: &str, domain: &str, callback_url: &str) -> Value {
        json!({
            "task_guid": guid,
            "domain": domain,
            "rootfs": self.root_fs,
            "action": {
                "run": {
                    "path": "bash",
                    "args": ["-c", format!("echo '{guid}' > /tmp/output")],
                }
            },
            "completion_callback_url": callback_url,
            "disk_mb": 64,
            "memory_mb": 64,
            "egress_rules": [{ "protocol": "all", "destinations": ["0.0.0.0/0"] }],
            "result_file": "/tmp/output",
        })
    }
}
