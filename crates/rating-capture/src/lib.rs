//! Rating change capture
//!
//! Observes create/update notifications from the persistence layer and
//! appends one compact record per rating change to a local append-only
//! buffer file, where an offline consumer (the incremental model updater)
//! picks them up.
//!
//! # Overview
//!
//! - **ChangeInterceptor**: filters notifications down to ratings and
//!   formats `NEW#<user>#<item>#<rating>` / `UPDATE#...` records
//! - **BufferWriter**: best-effort open-append-close of one line per record
//! - **CaptureDiagnostics**: injected structured logging for both
//! - **scan_buffer**: read-only view of a buffer for operators and consumers
//!
//! # Example
//!
//! ```rust
//! use rating_capture::prelude::*;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = CaptureConfig::default().with_buffer_path(dir.path().join("data.buf"));
//! let interceptor = ChangeInterceptor::from_config(&config, TracingDiagnostics::shared());
//!
//! let rating = Rating::new(UserId(7), ItemId(42), RatingValue::new(4.5).unwrap());
//! interceptor.on_after_save(&Entity::Rating(rating));
//!
//! let scan = scan_buffer(dir.path().join("data.buf")).unwrap();
//! assert_eq!(scan.records.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod interceptor;
pub mod protocol;
pub mod scan;
pub mod types;

// Re-exports
pub use buffer::{AppendOutcome, BufferWriter, RecordSink};
pub use config::{BufferConfig, CaptureConfig, Durability, WriteOrdering, DEFAULT_BUFFER_PATH};
pub use diagnostics::{CaptureDiagnostics, CaptureEvent, MemoryDiagnostics, TracingDiagnostics};
pub use error::{BufferError, CaptureError, ConfigError, FailureStage, RatingError, RecordError};
pub use interceptor::{ChangeInterceptor, PersistenceListener};
pub use protocol::{
    check_compatibility, format_record, parse_record, Compatibility, ProtocolVersion, NEW_PREFIX,
    PROTOCOL_VERSION, UPDATE_PREFIX,
};
pub use scan::{scan_buffer, scan_bytes, scan_str, BufferScan, MalformedLine};
pub use types::{
    ChangeEvent, ChangeKind, Entity, EntityKind, ItemId, Movie, Rating, RatingValue, User, UserId,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for wiring capture into a persistence layer
    pub use crate::{
        scan_buffer, AppendOutcome, BufferConfig, BufferWriter, CaptureConfig, CaptureDiagnostics,
        ChangeInterceptor, ChangeKind, Entity, ItemId, PersistenceListener, Rating, RatingValue,
        TracingDiagnostics, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
