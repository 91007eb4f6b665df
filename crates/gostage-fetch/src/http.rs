use crate::{DependencySource, FetchError, UpstreamIndex};
use std::io::Read;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::config::Config::builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// HTTP-backed artifact source with a bounded per-request timeout.
///
/// `file://` locators are served by a local read so that cached-mirror
/// manifests work without any network capability being exercised.
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

fn file_uri_path(uri: &str) -> Option<&Path> {
    uri.strip_prefix("file://").map(Path::new)
}

impl DependencySource for HttpSource {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(path) = file_uri_path(uri) {
            tracing::debug!("reading local mirror {}", path.display());
            return match std::fs::read(path) {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(FetchError::NotFound(uri.to_owned()))
                }
                Err(e) => Err(FetchError::Io(e)),
            };
        }
        if !uri.starts_with("http://") && !uri.starts_with("https://") {
            return Err(FetchError::UnsupportedScheme(uri.to_owned()));
        }

        tracing::debug!("GET {uri}");
        let resp = match self.agent.get(uri).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(FetchError::NotFound(uri.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(FetchError::Http(format!("HTTP {code} for {uri}")));
            }
            Err(ureq::Error::Timeout(_)) => {
                return Err(FetchError::Timeout(uri.to_owned()));
            }
            Err(e) => {
                return Err(FetchError::Http(e.to_string()));
            }
        };

        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(body)
    }
}

/// Existence probe against the origin, implemented as an HTTP HEAD request.
pub struct HttpUpstreamIndex {
    agent: ureq::Agent,
}

impl HttpUpstreamIndex {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
        }
    }
}

impl Default for HttpUpstreamIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl UpstreamIndex for HttpUpstreamIndex {
    fn exists(&self, uri: &str) -> Result<bool, FetchError> {
        if let Some(path) = file_uri_path(uri) {
            return Ok(path.exists());
        }
        if !uri.starts_with("http://") && !uri.starts_with("https://") {
            return Err(FetchError::UnsupportedScheme(uri.to_owned()));
        }

        tracing::debug!("HEAD {uri}");
        match self.agent.head(uri).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(404)) => Ok(false),
            Err(ureq::Error::StatusCode(code)) => {
                Err(FetchError::Http(format!("HTTP {code} for HEAD {uri}")))
            }
            Err(ureq::Error::Timeout(_)) => Err(FetchError::Timeout(uri.to_owned())),
            Err(e) => Err(FetchError::Http(e.to_string())),
        }
    }
}
