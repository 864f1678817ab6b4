//! Injected structured logging for the capture path
//!
//! Both the interceptor and the buffer writer report through a
//! [`CaptureDiagnostics`] handed to them at construction. Production code
//! uses [`TracingDiagnostics`]; tests use [`MemoryDiagnostics`] and assert on
//! the collected events.

use crate::error::{BufferError, FailureStage};
use crate::types::{ChangeEvent, ChangeKind, EntityKind};
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

/// Something worth logging on the capture path
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Notification for an entity kind we do not capture
    EntitySkipped {
        /// Kind of the ignored entity
        entity: EntityKind,
    },
    /// A persisted rating change was observed
    ChangeDetected {
        /// The observed change
        event: ChangeEvent,
    },
    /// The record for a change reached the buffer
    RecordBuffered {
        /// Created or updated
        change_kind: ChangeKind,
        /// Record line, without terminator
        record: String,
    },
    /// The buffer file did not exist and was created
    BufferCreated {
        /// Buffer path
        path: PathBuf,
    },
    /// An append failed; the record was dropped unless `stage` is `Sync`
    BufferFailure {
        /// Buffer path
        path: PathBuf,
        /// Where in the cycle it failed
        stage: FailureStage,
        /// Underlying I/O error kind, if any
        kind: Option<io::ErrorKind>,
        /// Rendered error
        message: String,
    },
}

impl CaptureEvent {
    /// Build a failure event from a buffer error
    #[must_use]
    pub fn failure(path: impl Into<PathBuf>, error: &BufferError) -> Self {
        Self::BufferFailure {
            path: path.into(),
            stage: error.stage(),
            kind: error.io_kind(),
            message: error.to_string(),
        }
    }

    /// Severity of this event
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::EntitySkipped { .. } | Self::BufferCreated { .. } => Level::DEBUG,
            Self::ChangeDetected { .. } | Self::RecordBuffered { .. } => Level::INFO,
            Self::BufferFailure { .. } => Level::ERROR,
        }
    }
}

/// Sink for capture events
pub trait CaptureDiagnostics: Send + Sync {
    /// Record one event
    fn record(&self, event: CaptureEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl TracingDiagnostics {
    /// Shared handle, ready to inject
    #[must_use]
    pub fn shared() -> Arc<dyn CaptureDiagnostics> {
        Arc::new(Self)
    }
}

impl CaptureDiagnostics for TracingDiagnostics {
    fn record(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::EntitySkipped { entity } => {
                tracing::debug!(target: "rating_capture", %entity, "ignoring non-rating entity");
            }
            CaptureEvent::ChangeDetected { event } => {
                tracing::info!(
                    target: "rating_capture",
                    change = %event.change_kind(),
                    user_id = %event.user_id(),
                    item_id = %event.item_id(),
                    rating = %event.rating(),
                    "rating change detected"
                );
            }
            CaptureEvent::RecordBuffered { change_kind, record } => {
                tracing::info!(
                    target: "rating_capture",
                    change = %change_kind,
                    %record,
                    "rating change written into buffer"
                );
            }
            CaptureEvent::BufferCreated { path } => {
                tracing::debug!(target: "rating_capture", path = %path.display(), "buffer file created");
            }
            CaptureEvent::BufferFailure {
                path,
                stage,
                kind,
                message,
            } if stage == FailureStage::Sync => {
                tracing::error!(
                    target: "rating_capture",
                    path = %path.display(),
                    stage = stage.as_str(),
                    kind = ?kind,
                    error = %message,
                    "buffer sync failed, record written but may not be durable"
                );
            }
            CaptureEvent::BufferFailure {
                path,
                stage,
                kind,
                message,
            } => {
                tracing::error!(
                    target: "rating_capture",
                    path = %path.display(),
                    stage = stage.as_str(),
                    kind = ?kind,
                    error = %message,
                    "buffer append failed, record dropped"
                );
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<CaptureEvent>>,
}

impl MemoryDiagnostics {
    /// Create empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far, in order
    #[must_use]
    pub fn events(&self) -> Vec<CaptureEvent> {
        self.events.lock().clone()
    }

    /// Only the `BufferFailure` events
    #[must_use]
    pub fn failures(&self) -> Vec<CaptureEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, CaptureEvent::BufferFailure { .. }))
            .cloned()
            .collect()
    }

    /// Events at exactly `level`
    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<CaptureEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level() == level)
            .cloned()
            .collect()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl CaptureDiagnostics for MemoryDiagnostics {
    fn record(&self, event: CaptureEvent) {
        self.events.lock().push(event);
    }
}
