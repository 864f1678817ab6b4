//! fsync helpers for `Durability::Sync`.
//!
//! Creating the buffer file adds a directory entry; without syncing the
//! directory the file itself may not survive a power loss even when its
//! contents were synced.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Sync a file's contents to disk.
pub(crate) fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_data()
}

/// Sync the directory holding `path`.
///
/// A bare file name refers to the working directory.
pub(crate) fn fsync_parent(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    OpenOptions::new().read(true).open(dir)?.sync_all()
}
