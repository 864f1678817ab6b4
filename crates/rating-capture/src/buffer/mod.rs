//! Append-only buffer file
//!
//! Every append is a self-contained cycle: make sure the file exists, open
//! it in append mode, write one terminated record, flush, close. No handle
//! outlives a call, so a crash between appends never leaves buffered bytes
//! behind in this process.
//!
//! Appends are best-effort. [`BufferWriter::append`] never fails towards its
//! caller; errors become [`CaptureEvent::BufferFailure`] diagnostics and the
//! record is dropped, unless only the final flush or fsync failed, in which
//! case the line is already in the file and the outcome is
//! [`AppendOutcome::Unsynced`]. [`BufferWriter::try_append`] exposes the same
//! cycle with the error returned instead.

mod fsync;

use crate::config::{BufferConfig, Durability, WriteOrdering};
use crate::diagnostics::{CaptureDiagnostics, CaptureEvent};
use crate::error::{BufferError, FailureStage};
use crate::protocol::RECORD_TERMINATOR;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// What happened to a record handed to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The terminated record was written and flushed
    Written,
    /// The record is in the file but flush or fsync failed, so it may not
    /// survive a crash; a failure diagnostic was emitted
    Unsynced,
    /// The record was dropped; a failure diagnostic was emitted
    Dropped,
}

impl AppendOutcome {
    /// Outcome of an append that failed with `error`
    ///
    /// Only a sync failure happens after the bytes were handed to the file.
    #[inline]
    #[must_use]
    pub fn after_failure(error: &BufferError) -> Self {
        match error.stage() {
            FailureStage::Sync => Self::Unsynced,
            _ => Self::Dropped,
        }
    }

    /// The record reached the buffer file, durable or not
    #[inline]
    #[must_use]
    pub fn is_written(self) -> bool {
        matches!(self, Self::Written | Self::Unsynced)
    }
}

/// Destination for formatted buffer records
pub trait RecordSink: Send + Sync {
    /// Append one record line, without terminator. Must not panic or fail.
    fn append(&self, line: &str) -> AppendOutcome;
}

impl<S: RecordSink + ?Sized> RecordSink for Arc<S> {
    fn append(&self, line: &str) -> AppendOutcome {
        (**self).append(line)
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &S {
    fn append(&self, line: &str) -> AppendOutcome {
        (**self).append(line)
    }
}

/// Writer for the append-only buffer file
pub struct BufferWriter {
    config: BufferConfig,
    diagnostics: Arc<dyn CaptureDiagnostics>,
    order: Option<Mutex<()>>,
}

impl std::fmt::Debug for BufferWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferWriter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BufferWriter {
    /// Create a writer; the file is not touched until the first append
    #[must_use]
    pub fn new(config: BufferConfig, diagnostics: Arc<dyn CaptureDiagnostics>) -> Self {
        let order = match config.ordering {
            WriteOrdering::FileSystem => None,
            WriteOrdering::Serialized => Some(Mutex::new(())),
        };
        Self {
            config,
            diagnostics,
            order,
        }
    }

    /// Buffer file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Writer settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Append `line` plus a terminator; failures become diagnostics
    pub fn append(&self, line: &str) -> AppendOutcome {
        match self.try_append(line) {
            Ok(()) => AppendOutcome::Written,
            Err(err) => {
                self.diagnostics
                    .record(CaptureEvent::failure(self.path(), &err));
                AppendOutcome::after_failure(&err)
            }
        }
    }

    /// Append `line` plus a terminator, returning any failure
    ///
    /// The file handle is scoped to this call and released on every path.
    pub fn try_append(&self, line: &str) -> Result<(), BufferError> {
        if line.contains(['\n', '\r']) {
            return Err(BufferError::InvalidRecord);
        }

        let _order = self.order.as_ref().map(|m| m.lock());
        let path = self.path();

        self.ensure_exists()?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|source| BufferError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        // One write call per record keeps concurrent appenders from splitting lines.
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push(RECORD_TERMINATOR);

        file.write_all(record.as_bytes())
            .map_err(|source| BufferError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        let synced = match self.config.durability {
            Durability::Flush => file.flush(),
            Durability::Sync => file.flush().and_then(|()| fsync::fsync_file(&file)),
        };
        synced.map_err(|source| BufferError::Sync {
            path: path.to_path_buf(),
            source,
        })
    }

    fn ensure_exists(&self) -> Result<(), BufferError> {
        let path = self.path();
        let create_err = |source: io::Error| BufferError::Create {
            path: path.to_path_buf(),
            source,
        };

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => {
                self.diagnostics.record(CaptureEvent::BufferCreated {
                    path: path.to_path_buf(),
                });
                if self.config.durability == Durability::Sync {
                    fsync::fsync_parent(path).map_err(create_err)?;
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(source) => Err(create_err(source)),
        }
    }
}

impl RecordSink for BufferWriter {
    fn append(&self, line: &str) -> AppendOutcome {
        BufferWriter::append(self, line)
    }
}
