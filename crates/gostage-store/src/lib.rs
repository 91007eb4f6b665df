//! Content-addressed dependency artifact cache for gostage.
//!
//! This crate provides the storage layer: a `CacheStore` keyed by blake3
//! checksum with atomic temp-then-rename writes, and `CacheLayout` for the
//! on-disk directory structure and format-version marker. The cache is shared
//! by concurrent staging runs without locking — the final content-addressed
//! path is immutable once present.

pub mod cache;
pub mod layout;

pub use cache::{content_checksum, CacheRecord, CacheStore};
pub use layout::{CacheLayout, CACHE_FORMAT_VERSION};

use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// On Linux with ext4 `data=ordered` (the default), renames are usually
/// durable without an explicit dir fsync, but POSIX does not guarantee this.
/// Calling `fsync()` on the parent directory makes the rename durable on
/// all filesystems and mount configurations.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("integrity check failed for '{checksum}': content hashes to {actual}")]
    IntegrityFailure { checksum: String, actual: String },
    #[error("artifact not cached: {0}")]
    NotCached(String),
    #[error("cache format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
