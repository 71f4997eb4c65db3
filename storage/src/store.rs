//! Tag-and-JSON report log

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fezzik_core::{Report, ReportRecord, WorkloadKind};

use crate::error::{Result, StorageError};

/// Append-only log of finished scenario reports
///
/// One writer per run. The file is opened per append and never truncated,
/// so earlier runs stay readable.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    /// Store writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a tag line followed by a JSON line
    pub fn append(&self, record: &ReportRecord) -> Result<()> {
        let data = serde_json::to_string(&record.report).map_err(StorageError::Encode)?;
        let tag = record.kind.report_tag();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("{tag}\n{data}\n").as_bytes())?;
        file.flush()?;

        tracing::info!(
            path = %self.path.display(),
            tag,
            report = %record.report.report_name,
            "Report saved"
        );
        Ok(())
    }

    /// Replay a log into typed records
    ///
    /// Blank lines at the end of the file are ignored. Records keep file
    /// order within each kind.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedReports> {
        let contents = fs::read_to_string(path.as_ref())?;
        let reports = parse(&contents)?;

        tracing::debug!(
            path = %path.as_ref().display(),
            lrp_reports = reports.lrp_reports.len(),
            task_reports = reports.task_reports.len(),
            "Reports loaded"
        );
        Ok(reports)
    }
}

fn parse(contents: &str) -> Result<LoadedReports> {
    let mut lines: Vec<&str> = contents.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let mut reports = LoadedReports::default();
    let mut numbered = lines.into_iter().enumerate().map(|(i, line)| (i + 1, line));

    while let Some((line, tag)) = numbered.next() {
        let tag = tag.trim();
        let kind = WorkloadKind::from_report_tag(tag).ok_or_else(|| StorageError::UnknownTag {
            line,
            tag: tag.to_string(),
        })?;

        let (data_line, data) = numbered.next().ok_or(StorageError::MissingData { line })?;
        let report: Report = serde_json::from_str(data).map_err(|source| StorageError::Decode {
            line: data_line,
            tag: tag.to_string(),
            source,
        })?;

        let record = ReportRecord::new(kind, report);
        match kind {
            WorkloadKind::LongRunningProcess => reports.lrp_reports.push(record),
            WorkloadKind::Task => reports.task_reports.push(record),
        }
    }

    Ok(reports)
}

/// Records replayed from a log, split by kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedReports {
    /// Long-running process reports in file order
    pub lrp_reports: Vec<ReportRecord>,
    /// Task reports in file order
    pub task_reports: Vec<ReportRecord>,
}

impl LoadedReports {
    /// Total number of records
    pub fn len(&self) -> usize {
        self.lrp_reports.len() + self.task_reports.len()
    }

    /// Whether the log held no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record, task reports first
    pub fn iter(&self) -> impl Iterator<Item = &ReportRecord> {
        self.task_reports.iter().chain(self.lrp_reports.iter())
    }
}
