//! Error type shared by the geometry model, simplifier, and codec.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for polysimp operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Fewer than 3 distinct points, duplicate-only input, or non-finite coordinates.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invalid tolerance {0}: must be finite and > 0")]
    InvalidTolerance(f64),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unrecognized tag, version or shape kind, or a declared length that does
    /// not match the stream.
    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    /// Framing overrun, inconsistent counts, or an unclosed ring.
    #[error("corrupt record {record}: {reason}")]
    CorruptRecord { record: usize, reason: String },

    /// Caller handed the codec records it cannot write as asked.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn record(record: usize, reason: impl Into<String>) -> Self {
        Error::CorruptRecord {
            record,
            reason: reason.into(),
        }
    }

    /// Short, stable name of the error kind (used in logs and CLI summaries).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DegenerateGeometry(_) => "DegenerateGeometry",
            Error::InvalidTolerance(_) => "InvalidTolerance",
            Error::Io { .. } => "IoError",
            Error::CorruptHeader(_) => "CorruptHeader",
            Error::CorruptRecord { .. } => "CorruptRecord",
            Error::InvalidInput(_) => "InvalidInput",
        }
    }
}

/// Result type alias for polysimp operations.
pub type Result<T> = std::result::Result<T, Error>;
