//! Change interceptor
//!
//! Bridges the persistence layer's "entity saved / updated" notifications to
//! buffer records. Only ratings are captured; every other entity kind is a
//! silent skip. Nothing here ever fails towards the persistence layer.

use crate::buffer::{AppendOutcome, BufferWriter, RecordSink};
use crate::config::CaptureConfig;
use crate::diagnostics::{CaptureDiagnostics, CaptureEvent};
use crate::protocol::format_record;
use crate::types::{ChangeEvent, ChangeKind, Entity};
use std::sync::Arc;

/// Hook the persistence layer calls after a successful write
///
/// Called exactly once per committed create or update, with the entity as
/// it was persisted.
pub trait PersistenceListener: Send + Sync {
    /// A new entity was saved
    fn after_save(&self, entity: &Entity);
    /// An existing entity was updated
    fn after_update(&self, entity: &Entity);
}

/// Captures rating changes into a record sink
pub struct ChangeInterceptor<S = BufferWriter> {
    sink: S,
    diagnostics: Arc<dyn CaptureDiagnostics>,
}

impl ChangeInterceptor<BufferWriter> {
    /// Interceptor writing to the buffer file described by `config`
    #[must_use]
    pub fn from_config(config: &CaptureConfig, diagnostics: Arc<dyn CaptureDiagnostics>) -> Self {
        let writer = BufferWriter::new(config.buffer.clone(), Arc::clone(&diagnostics));
        Self::new(writer, diagnostics)
    }
}

impl<S: RecordSink> ChangeInterceptor<S> {
    /// Create interceptor over an arbitrary sink
    #[must_use]
    pub fn new(sink: S, diagnostics: Arc<dyn CaptureDiagnostics>) -> Self {
        Self { sink, diagnostics }
    }

    /// The sink records are forwarded to
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Capture a newly saved entity
    ///
    /// Returns `None` when the entity is not a rating.
    pub fn on_after_save(&self, entity: &Entity) -> Option<AppendOutcome> {
        self.capture(ChangeKind::Created, entity)
    }

    /// Capture an updated entity
    ///
    /// Returns `None` when the entity is not a rating.
    pub fn on_after_update(&self, entity: &Entity) -> Option<AppendOutcome> {
        self.capture(ChangeKind::Updated, entity)
    }

    fn capture(&self, change_kind: ChangeKind, entity: &Entity) -> Option<AppendOutcome> {
        let Entity::Rating(rating) = entity else {
            self.diagnostics.record(CaptureEvent::EntitySkipped {
                entity: entity.kind(),
            });
            return None;
        };

        let event = ChangeEvent::from_rating(change_kind, rating);
        self.diagnostics.record(CaptureEvent::ChangeDetected { event });

        let record = format_record(&event);
        let outcome = self.sink.append(&record);
        if outcome.is_written() {
            self.diagnostics
                .record(CaptureEvent::RecordBuffered { change_kind, record });
        }
        Some(outcome)
    }
}

impl<S: RecordSink> PersistenceListener for ChangeInterceptor<S> {
    fn after_save(&self, entity: &Entity) {
        let _ = self.on_after_save(entity);
    }

    fn after_update(&self, entity: &Entity) {
        let _ = self.on_after_update(entity);
    }
}
