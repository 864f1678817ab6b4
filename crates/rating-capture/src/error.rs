//! Error types for rating capture
//!
//! Covers:
//! - Buffer file lifecycle failures (create, open, write, sync, read)
//! - Malformed buffer records on the consumer side
//! - Invalid rating values
//! - Configuration loading
//!
//! None of these ever reach the persistence layer: the best-effort paths
//! turn them into diagnostics and drop the record.

use std::io;
use std::path::PathBuf;

/// Top-level error for the crate
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Buffer file failure
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Record could not be parsed
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Rating value rejected
    #[error("rating error: {0}")]
    Rating(#[from] RatingError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Stage of the append cycle that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// Record rejected before touching the file
    Validate,
    /// Buffer file could not be created
    Create,
    /// Buffer file could not be opened for append
    Open,
    /// Record bytes could not be written
    Write,
    /// Flush or fsync failed
    Sync,
    /// Buffer file could not be read back
    Read,
}

impl FailureStage {
    /// Stable lowercase name, used as a structured log field
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Create => "create",
            Self::Open => "open",
            Self::Write => "write",
            Self::Sync => "sync",
            Self::Read => "read",
        }
    }
}

/// Buffer file errors
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// Record would not occupy exactly one line
    #[error("record contains a line terminator")]
    InvalidRecord,

    /// Creating the buffer file failed
    #[error("failed to create buffer {path}: {source}")]
    Create {
        /// Buffer path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Opening the buffer file in append mode failed
    #[error("failed to open buffer {path}: {source}")]
    Open {
        /// Buffer path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing the record failed
    #[error("failed to write buffer {path}: {source}")]
    Write {
        /// Buffer path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Flushing or syncing the record failed
    #[error("failed to sync buffer {path}: {source}")]
    Sync {
        /// Buffer path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading the buffer back failed
    #[error("failed to read buffer {path}: {source}")]
    Read {
        /// Buffer path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl BufferError {
    /// Which stage of the cycle failed
    #[must_use]
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::InvalidRecord => FailureStage::Validate,
            Self::Create { .. } => FailureStage::Create,
            Self::Open { .. } => FailureStage::Open,
            Self::Write { .. } => FailureStage::Write,
            Self::Sync { .. } => FailureStage::Sync,
            Self::Read { .. } => FailureStage::Read,
        }
    }

    /// Kind of the underlying I/O error, if any
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::InvalidRecord => None,
            Self::Create { source, .. }
            | Self::Open { source, .. }
            | Self::Write { source, .. }
            | Self::Sync { source, .. }
            | Self::Read { source, .. } => Some(source.kind()),
        }
    }
}

/// Buffer record parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Line is not valid UTF-8
    #[error("record is not valid UTF-8")]
    NotUtf8,

    /// Line does not start with a known change prefix
    #[error("unknown record prefix in {0:?}")]
    UnknownPrefix(String),

    /// Wrong number of `#`-separated fields after the prefix
    #[error("expected 3 fields, found {found}")]
    FieldCount {
        /// Number of fields present
        found: usize,
    },

    /// User id is not an unsigned integer
    #[error("invalid user id {0:?}")]
    InvalidUserId(String),

    /// Item id is not an unsigned integer
    #[error("invalid item id {0:?}")]
    InvalidItemId(String),

    /// Rating is not a finite number
    #[error("invalid rating {0:?}")]
    InvalidRating(String),
}

/// Rating value errors
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RatingError {
    /// NaN or infinite
    #[error("rating must be finite, got {0}")]
    NotFinite(f64),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Config content is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
