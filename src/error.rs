//! Error types for tracksift.
//!
//! Fatal conditions (unclassifiable input, malformed array envelope,
//! unwritable output) are modeled here. Recoverable conditions (an NDJSON
//! line that fails to parse, a field value that is not a timestamp) are
//! not errors: they are tallied or ignored and the run continues.

use thiserror::Error;

/// Errors that can occur while classifying or streaming an export file.
#[derive(Debug, Error)]
pub enum Error {
    /// The input's top-level structure could not be classified, or the
    /// configured records key is missing or does not hold an array.
    #[error("unrecognized input shape: {reason}")]
    Shape { reason: String },

    /// Structural parse failure on the array envelope or a framed record.
    #[error("malformed input near byte {offset}: {reason}")]
    Parse { offset: u64, reason: String },

    /// The stream ended in the middle of a structure (truncated file).
    /// Consumers treat this as graceful termination with partial results.
    #[error("input truncated near byte {offset}")]
    TruncatedInput { offset: u64 },

    /// Underlying I/O failure on the input or output stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the input simply ended early, so partial
    /// statistics or a partial export are still meaningful.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::TruncatedInput { .. })
    }
}

/// Result type for tracksift operations.
pub type Result<T> = std::result::Result<T, Error>;
