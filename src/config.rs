//! Suite configuration

use std::path::{Path, PathBuf};

use fezzik_core::{ConfigError, ScenarioConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything one suite run needs apart from the orchestrator client
///
/// Loadable from JSON. Every field has a default, so a config file only
/// names what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Namespace every workload is created in
    pub domain: String,

    /// Fleet size used for scaling and report names; `None` uses the
    /// number of nodes the orchestrator lists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_cells: Option<usize>,

    /// Instances per cell for each long-running process scenario
    pub lrp_factors: Vec<usize>,

    /// Tasks per cell for each task scenario
    pub task_factors: Vec<usize>,

    /// Report log location
    pub report_path: PathBuf,

    /// Address the orchestrator can reach this process on
    pub callback_host: String,

    /// Long-running process scenario settings
    pub lrp: ScenarioConfig,

    /// Task scenario settings
    pub task: ScenarioConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            domain: "fezzik".to_string(),
            num_cells: None,
            lrp_factors: vec![5, 200],
            task_factors: vec![1, 5, 10, 20, 40],
            report_path: PathBuf::from("./reports.json"),
            callback_host: "10.0.2.2".to_string(),
            lrp: ScenarioConfig::default(),
            task: ScenarioConfig::default(),
        }
    }
}

impl SuiteConfig {
    /// Read a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SuiteConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Set the namespace
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Pin the fleet size
    pub fn with_num_cells(mut self, num_cells: usize) -> Self {
        self.num_cells = Some(num_cells);
        self
    }

    /// Set the long-running process scale factors
    pub fn with_lrp_factors(mut self, factors: Vec<usize>) -> Self {
        self.lrp_factors = factors;
        self
    }

    /// Set the task scale factors
    pub fn with_task_factors(mut self, factors: Vec<usize>) -> Self {
        self.task_factors = factors;
        self
    }

    /// Set the report log location
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    /// Set the callback host
    pub fn with_callback_host(mut self, host: impl Into<String>) -> Self {
        self.callback_host = host.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SuiteConfigError> {
        if self.domain.trim().is_empty() {
            return Err(SuiteConfigError::Invalid("domain must not be empty".into()));
        }
        if self.num_cells == Some(0) {
            return Err(SuiteConfigError::Invalid(
                "num_cells must be at least 1 when set".into(),
            ));
        }
        if self.lrp_factors.contains(&0) || self.task_factors.contains(&0) {
            return Err(SuiteConfigError::Invalid(
                "scale factors must be at least 1".into(),
            ));
        }
        if self.callback_host.trim().is_empty() {
            return Err(SuiteConfigError::Invalid(
                "callback_host must not be empty".into(),
            ));
        }

        self.lrp
            .validate()
            .map_err(|source| SuiteConfigError::Scenario { scenario: "lrp", source })?;
        self.task
            .validate()
            .map_err(|source| SuiteConfigError::Scenario { scenario: "task", source })?;

        Ok(())
    }
}

/// Suite configuration errors
#[derive(Debug, Error)]
pub enum SuiteConfigError {
    /// The file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file was not a valid config
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A suite-level field is out of range
    #[error("invalid suite config: {0}")]
    Invalid(String),

    /// A scenario section is out of range
    #[error("invalid {scenario} config: {source}")]
    Scenario {
        /// Section name
        scenario: &'static str,
        /// Underlying error
        #[source]
        source: ConfigError,
    },
}
