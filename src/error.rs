use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while scanning a JSON stream
///
/// All errors are fatal: the scan aborts on the first failure and nothing is
/// retried. Partial results delivered to the record sink before the error are
/// not rolled back.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input file does not exist
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The byte stream is not valid JSON
    #[error("malformed JSON at byte {offset}: {reason}")]
    MalformedJson { offset: u64, reason: String },

    /// A path pattern string could not be parsed
    #[error("invalid path pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    /// Read or sink failure mid-stream
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        ScanError::MalformedJson {
            offset,
            reason: reason.into(),
        }
    }
}
