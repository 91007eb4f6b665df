//! Dependency acquisition for gostage.
//!
//! This crate is the single place in the system permitted to perform network
//! I/O. It provides the `DependencySource` (artifact fetch) and
//! `UpstreamIndex` (origin existence probe) capability traits, an HTTP
//! implementation over ureq with a bounded per-request timeout, and the
//! mode-branching `acquire` operation: cache-first, fetch-on-miss, with
//! checksum verification before anything touches the cache.
//!
//! Isolated mode is expressed by absence: callers that must not touch the
//! network simply never construct a source, and `acquire` receives `None`.

pub mod acquire;
pub mod http;

pub use acquire::{acquire, AcquireError, LocalArtifact};
pub use http::{HttpSource, HttpUpstreamIndex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("fetch timed out: {0}")]
    Timeout(String),
    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),
}

/// Capability to retrieve dependency artifact bytes from a source locator.
///
/// Implementations are injected only in online mode; no other component
/// carries a network capability.
pub trait DependencySource {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError>;
}

/// Capability to ask the origin whether a resource exists at all.
///
/// Consulted by the version resolver's online path to distinguish a catalog
/// gap from a version that does not exist upstream.
pub trait UpstreamIndex {
    fn exists(&self, uri: &str) -> Result<bool, FetchError>;
}
