//! Testing utilities for the rating-capture workspace
//!
//! Shared fixtures: temporary buffers, sample entities, line readers.

#![allow(missing_docs)]

use rating_capture::{
    BufferConfig, BufferWriter, CaptureConfig, ChangeInterceptor, Entity, ItemId, MemoryDiagnostics,
    Movie, Rating, RatingValue, User, UserId,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A buffer path inside a private temporary directory
///
/// The directory is removed when this value is dropped.
pub struct TempBuffer {
    dir: TempDir,
    path: PathBuf,
}

impl TempBuffer {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.buf");
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> BufferConfig {
        BufferConfig::new().with_path(&self.path)
    }

    /// Raw file content; empty when the file does not exist
    pub fn contents(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_default()
    }

    /// Buffer lines without terminators
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn writer(&self, config: BufferConfig) -> (BufferWriter, Arc<MemoryDiagnostics>) {
        let diag = Arc::new(MemoryDiagnostics::new());
        (BufferWriter::new(config, diag.clone()), diag)
    }

    pub fn interceptor(&self) -> (ChangeInterceptor, Arc<MemoryDiagnostics>) {
        let diag = Arc::new(MemoryDiagnostics::new());
        let config = CaptureConfig::default().with_buffer_path(&self.path);
        (ChangeInterceptor::from_config(&config, diag.clone()), diag)
    }
}

impl Default for TempBuffer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn rating(user: u64, item: u64, value: f64) -> Rating {
    Rating::new(UserId(user), ItemId(item), RatingValue::new(value).unwrap())
}

pub fn rating_entity(user: u64, item: u64, value: f64) -> Entity {
    Entity::Rating(rating(user, item, value))
}

pub fn user_entity(id: u64) -> Entity {
    Entity::User(User {
        id: UserId(id),
        username: format!("user{id}"),
    })
}

pub fn movie_entity(id: u64) -> Entity {
    Entity::Movie(Movie {
        id: ItemId(id),
        title: format!("movie {id}"),
    })
}
