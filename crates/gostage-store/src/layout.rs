use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Current cache format version. Incremented on incompatible layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;
const VERSION_FILE: &str = "version";

/// Directory layout for the gostage dependency cache.
///
/// The cache root is configurable and must survive across staging
/// invocations — that persistence is what delivers the no-network guarantee
/// in isolated mode for previously seen versions.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheVersion {
    format_version: u32,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content-addressed artifacts, one file per checksum.
    #[inline]
    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("cache").join("objects")
    }

    /// Scratch area for in-flight downloads before they are verified and
    /// atomically placed.
    #[inline]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("cache").join("staging")
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.objects_dir())?;
        fs::create_dir_all(self.staging_dir())?;

        let version_path = self.root.join("cache").join(VERSION_FILE);
        if version_path.exists() {
            self.verify_version()?;
        } else {
            let ver = CacheVersion {
                format_version: CACHE_FORMAT_VERSION,
            };
            let content = serde_json::to_string_pretty(&ver)?;
            let cache_dir = self.root.join("cache");
            let mut tmp = NamedTempFile::new_in(&cache_dir)?;
            tmp.write_all(content.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&version_path)
                .map_err(|e| StoreError::Io(e.error))?;
            crate::fsync_dir(&cache_dir)?;
        }

        Ok(())
    }

    pub fn verify_version(&self) -> Result<(), StoreError> {
        let version_path = self.root.join("cache").join(VERSION_FILE);
        let content = fs::read_to_string(&version_path)?;
        let ver: CacheVersion = serde_json::from_str(&content)?;

        if ver.format_version != CACHE_FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: CACHE_FORMAT_VERSION,
                found: ver.format_version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = CacheLayout::new("/tmp/gostage-test");
        assert_eq!(
            layout.objects_dir(),
            PathBuf::from("/tmp/gostage-test/cache/objects")
        );
        assert_eq!(
            layout.staging_dir(),
            PathBuf::from("/tmp/gostage-test/cache/staging")
        );
    }

    #[test]
    fn initialize_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();

        assert!(layout.objects_dir().is_dir());
        assert!(layout.staging_dir().is_dir());
    }

    #[test]
    fn initialize_writes_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_rejects_future_format() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();

        let version_path = dir.path().join("cache").join("version");
        fs::write(&version_path, r#"{"format_version": 99}"#).unwrap();

        assert!(matches!(
            layout.initialize(),
            Err(StoreError::VersionMismatch {
                expected: CACHE_FORMAT_VERSION,
                found: 99
            })
        ));
    }
}
