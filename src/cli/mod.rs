//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fezzik::SuiteConfig;
use fezzik_storage::ReportStore;

#[derive(Parser)]
#[command(name = "fezzik")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the summary of every report in a report log
    Replay {
        /// Path to the report log
        #[arg(short, long, default_value = "./reports.json")]
        input: PathBuf,
    },
    /// Validate a suite configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Cli {
    /// Run the selected command
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Replay { input } => replay(input),
            Commands::Validate { config } => validate(config),
        }
    }
}

fn replay(input: &Path) -> Result<()> {
    let reports = ReportStore::load(input)
        .with_context(|| format!("failed to load reports from {}", input.display()))?;
    tracing::info!(
        lrp_reports = reports.lrp_reports.len(),
        task_reports = reports.task_reports.len(),
        "Replaying reports"
    );

    for record in reports.iter() {
        println!("{}", record.summary());
    }
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let config = SuiteConfig::from_file(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("{} is not a valid suite config", path.display()))?;

    println!(
        "{} is valid: domain {}, {} lrp and {} task scenarios",
        path.display(),
        config.domain,
        config.lrp_factors.len(),
        config.task_factors.len()
    );
    Ok(())
}
