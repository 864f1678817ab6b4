//! Capture configuration
//!
//! Defaults reproduce the historical behaviour: `data.buf` in the working
//! directory, no fsync, no cross-call lock. Everything can be overridden
//! from a TOML file:
//!
//! ```toml
//! [buffer]
//! path = "/var/lib/recommender/data.buf"
//! durability = "sync"
//! ordering = "serialized"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default buffer file name, relative to the working directory
pub const DEFAULT_BUFFER_PATH: &str = "data.buf";

/// How hard an append pushes the record towards the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Flush and close; the OS page cache owns the bytes afterwards
    #[default]
    Flush,
    /// Also `fsync` the file (and its directory on creation)
    Sync,
}

/// Ordering between concurrent appends through one writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrdering {
    /// Rely on append-mode semantics only
    #[default]
    FileSystem,
    /// Hold a lock across each open-write-close cycle
    Serialized,
}

/// Buffer writer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Buffer file location
    pub path: PathBuf,
    /// Flush or fsync per append
    pub durability: Durability,
    /// Cross-call ordering
    pub ordering: WriteOrdering,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_BUFFER_PATH),
            durability: Durability::default(),
            ordering: WriteOrdering::default(),
        }
    }
}

impl BufferConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With buffer path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// With durability
    #[inline]
    #[must_use]
    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// With ordering
    #[inline]
    #[must_use]
    pub fn with_ordering(mut self, ordering: WriteOrdering) -> Self {
        self.ordering = ordering;
        self
    }
}

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// `[buffer]` table
    pub buffer: BufferConfig,
}

impl CaptureConfig {
    /// With buffer path
    #[inline]
    #[must_use]
    pub fn with_buffer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.buffer.path = path.into();
        self
    }

    /// Parse from TOML text; missing keys take their defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_historical_behaviour() {
        let config = CaptureConfig::default();
        assert_eq!(config.buffer.path, PathBuf::from("data.buf"));
        assert_eq!(config.buffer.durability, Durability::Flush);
        assert_eq!(config.buffer.ordering, WriteOrdering::FileSystem);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(CaptureConfig::from_toml_str("").unwrap(), CaptureConfig::default());
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config = CaptureConfig::from_toml_str(
            r#"
            [buffer]
            durability = "sync"
            "#,
        )
        .unwrap();
        assert_eq!(config.buffer.durability, Durability::Sync);
        assert_eq!(config.buffer.path, PathBuf::from(DEFAULT_BUFFER_PATH));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CaptureConfig::from_toml_str(
            r#"
            [buffer]
            rotate = true
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[buffer]\npath = \"ratings.buf\"\nordering = \"serialized\"").unwrap();

        let config = CaptureConfig::load(file.path()).unwrap();
        assert_eq!(config.buffer.path, PathBuf::from("ratings.buf"));
        assert_eq!(config.buffer.ordering, WriteOrdering::Serialized);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaptureConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn builder_overrides() {
        let config = BufferConfig::new()
            .with_path("x.buf")
            .with_durability(Durability::Sync)
            .with_ordering(WriteOrdering::Serialized);
        assert_eq!(config.path, PathBuf::from("x.buf"));
        assert_eq!(config.durability, Durability::Sync);
        assert_eq!(config.ordering, WriteOrdering::Serialized);
    }
}
