use crate::{DependencySource, FetchError};
use gostage_schema::DependencyEntry;
use gostage_store::{content_checksum, CacheStore, StoreError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("dependency {uri} is not in the local cache and network access is forbidden")]
    CacheMiss { uri: String },
    #[error("integrity check failed for {uri}: expected {expected}, got {actual}")]
    Integrity {
        uri: String,
        expected: String,
        actual: String,
    },
    #[error("acquisition timed out for {uri}")]
    Timeout { uri: String },
    #[error("fetch error: {0}")]
    Fetch(FetchError),
    #[error("cache error: {0}")]
    Store(#[from] StoreError),
}

/// A verified, locally present dependency artifact.
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    pub entry: DependencyEntry,
    pub path: PathBuf,
    /// Locator shown in staging logs: the original remote URI when the
    /// artifact was fetched this run, or a `file://` form on a cache hit so
    /// downstream logs read as a local resolution.
    pub locator: String,
}

/// Acquire a resolved dependency: cache first, then (online only) fetch,
/// verify, and populate the cache.
///
/// `source == None` means isolated mode — a cache miss is fatal and no
/// fallback exists, because no network capability was ever constructed.
pub fn acquire(
    entry: &DependencyEntry,
    cache: &CacheStore,
    source: Option<&dyn DependencySource>,
) -> Result<LocalArtifact, AcquireError> {
    if let Some(record) = cache.lookup(&entry.checksum)? {
        cache.verify(&entry.checksum)?;
        tracing::debug!("cache hit for {} {}", entry.name, entry.version);
        return Ok(LocalArtifact {
            entry: entry.clone(),
            locator: format!("file://{}", record.path.display()),
            path: record.path,
        });
    }

    let Some(source) = source else {
        return Err(AcquireError::CacheMiss {
            uri: entry.uri.clone(),
        });
    };

    tracing::debug!("cache miss, fetching {}", entry.uri);
    let bytes = source.fetch(&entry.uri).map_err(|e| match e {
        FetchError::Timeout(uri) => AcquireError::Timeout { uri },
        other => AcquireError::Fetch(other),
    })?;

    let actual = content_checksum(&bytes);
    if actual != entry.checksum {
        // fatal, and the cache stays untouched
        return Err(AcquireError::Integrity {
            uri: entry.uri.clone(),
            expected: entry.checksum.to_string(),
            actual: actual.into_inner(),
        });
    }

    let record = cache.store(&entry.checksum, &bytes)?;
    Ok(LocalArtifact {
        entry: entry.clone(),
        locator: entry.uri.clone(),
        path: record.path,
    })
}
