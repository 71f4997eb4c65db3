//! fezzik-storage: Append-only report log
//!
//! Every finished scenario appends two lines to one log file: a tag line
//! naming the workload kind (`LRP_REPORT` or `TASK_REPORT`) and a single
//! JSON line holding the full tracker state. The loader replays the log
//! into typed records for the `replay` command.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod store;

pub use error::{Result, StorageError};
pub use store::{LoadedReports, ReportStore};
