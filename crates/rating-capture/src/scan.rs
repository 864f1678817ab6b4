//! Read-only inspection of a buffer file
//!
//! Used by operators and consumers to see what a buffer holds without
//! draining it. A last line without terminator is a write that was cut off
//! and is reported, not parsed.

use crate::error::{BufferError, RecordError};
use crate::protocol::{parse_record, RECORD_TERMINATOR};
use crate::types::{ChangeEvent, ChangeKind};
use std::io;
use std::path::Path;

/// A complete line that did not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line_no: usize,
    /// Raw content, without terminator; invalid UTF-8 is replaced
    pub content: String,
    /// Why the line was rejected
    pub error: RecordError,
}

/// Contents of a buffer file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferScan {
    /// Parsed records, in file order
    pub records: Vec<ChangeEvent>,
    /// Complete lines that failed to parse
    pub malformed: Vec<MalformedLine>,
    /// File ends with an unterminated fragment
    pub truncated_tail: bool,
}

impl BufferScan {
    /// Number of records with the given change kind
    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.change_kind() == kind)
            .count()
    }

    /// No malformed lines and no truncated tail
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && !self.truncated_tail
    }
}

/// Scan buffer text
#[must_use]
pub fn scan_str(content: &str) -> BufferScan {
    scan_bytes(content.as_bytes())
}

/// Scan raw buffer bytes
///
/// A line that is not valid UTF-8 is reported as malformed; it never hides
/// the records around it.
#[must_use]
pub fn scan_bytes(content: &[u8]) -> BufferScan {
    let terminator = RECORD_TERMINATOR as u8;
    let mut scan = BufferScan::default();
    let mut rest = content;
    let mut line_no = 0;

    while let Some(end) = rest.iter().position(|&b| b == terminator) {
        line_no += 1;
        let raw = &rest[..end];
        rest = &rest[end + 1..];

        let parsed = std::str::from_utf8(raw)
            .map_err(|_| RecordError::NotUtf8)
            .and_then(parse_record);
        match parsed {
            Ok(record) => scan.records.push(record),
            Err(error) => scan.malformed.push(MalformedLine {
                line_no,
                content: String::from_utf8_lossy(raw).into_owned(),
                error,
            }),
        }
    }

    scan.truncated_tail = !rest.is_empty();
    scan
}

/// Scan the buffer file at `path`; a missing file is an empty buffer
pub fn scan_buffer(path: impl AsRef<Path>) -> Result<BufferScan, BufferError> {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(content) => Ok(scan_bytes(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BufferScan::default()),
        Err(source) => Err(BufferError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
