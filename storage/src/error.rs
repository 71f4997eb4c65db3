//! Error types for fezzik-storage

use thiserror::Error;

/// Report log errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the log failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A report could not be serialized
    #[error("failed to encode report: {0}")]
    Encode(#[source] serde_json::Error),

    /// A tag line named no known workload kind
    #[error("line {line}: unknown report tag {tag:?}")]
    UnknownTag {
        /// 1-based line number of the tag
        line: usize,
        /// The tag as read
        tag: String,
    },

    /// A tag line was not followed by a data line
    #[error("line {line}: report tag has no data line")]
    MissingData {
        /// 1-based line number of the tag
        line: usize,
    },

    /// A data line was not a valid report
    #[error("line {line}: invalid {tag} data: {source}")]
    Decode {
        /// 1-based line number of the data
        line: usize,
        /// Tag the data followed
        tag: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;
