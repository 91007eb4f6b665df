use crate::layout::CacheLayout;
use crate::{fsync_dir, StoreError};
use gostage_schema::Checksum;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A cached dependency artifact.
///
/// Records are keyed by checksum, not by (name, version), so two catalog
/// entries with identical content share one artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub checksum: Checksum,
    pub path: PathBuf,
    pub size: u64,
}

/// Content-addressed dependency cache backed by blake3 hashing.
///
/// Writes are write-once and atomic: data is written to a temp file in the
/// staging area, verified against the declared checksum, then renamed into
/// the final content-addressed path. A reader never observes a partial
/// record, and concurrent stores of the same checksum cannot corrupt the
/// store — the rename target is immutable once present.
pub struct CacheStore {
    layout: CacheLayout,
}

impl CacheStore {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    /// Look up an artifact by checksum. No integrity check — use
    /// [`verify`](Self::verify) before trusting the content.
    pub fn lookup(&self, checksum: &Checksum) -> Result<Option<CacheRecord>, StoreError> {
        let path = self.layout.objects_dir().join(checksum.as_str());
        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(CacheRecord {
                checksum: checksum.clone(),
                path,
                size: meta.len(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Store data under its declared checksum.
    ///
    /// The content is hashed before placement; a mismatch fails without
    /// touching the final location. Storing an already-present checksum is a
    /// no-op returning the existing record.
    pub fn store(&self, checksum: &Checksum, data: &[u8]) -> Result<CacheRecord, StoreError> {
        let actual = blake3::hash(data).to_hex().to_string();
        if actual != checksum.as_str() {
            return Err(StoreError::IntegrityFailure {
                checksum: checksum.to_string(),
                actual,
            });
        }

        if let Some(existing) = self.lookup(checksum)? {
            tracing::debug!("cache hit on store, skipping write: {checksum}");
            return Ok(existing);
        }

        let dest = self.layout.objects_dir().join(checksum.as_str());
        let staging = self.layout.staging_dir();
        let mut tmp = NamedTempFile::new_in(&staging)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&self.layout.objects_dir())?;
        tracing::debug!("cached {} bytes under {checksum}", data.len());

        Ok(CacheRecord {
            checksum: checksum.clone(),
            path: dest,
            size: data.len() as u64,
        })
    }

    /// Recompute the hash of a cached artifact and compare it to its key.
    pub fn verify(&self, checksum: &Checksum) -> Result<(), StoreError> {
        let path = self.layout.objects_dir().join(checksum.as_str());
        if !path.exists() {
            return Err(StoreError::NotCached(checksum.to_string()));
        }
        let data = fs::read(&path)?;
        let actual = blake3::hash(&data).to_hex().to_string();
        if actual != checksum.as_str() {
            return Err(StoreError::IntegrityFailure {
                checksum: checksum.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

/// Checksum of a byte slice in the cache's content-address format.
pub fn content_checksum(data: &[u8]) -> Checksum {
    Checksum::new(blake3::hash(data).to_hex().to_string())
}
