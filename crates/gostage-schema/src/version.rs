//! Totally ordered dependency versions and prefix-wildcard requirements.
//!
//! Versions are dotted sequences of numeric components ("1.6.2"). Ordering is
//! componentwise numeric, so "1.10" sorts above "1.9" — lexicographic string
//! comparison would get this wrong.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version component '{component}' in '{version}'")]
    InvalidComponent { version: String, component: String },
}

/// A parsed dependency version: the original text plus its numeric components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    raw: String,
    components: Vec<u64>,
}

impl Version {
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        if text.is_empty() {
            return Err(VersionError::Empty);
        }
        let mut components = Vec::new();
        for part in text.split('.') {
            let n: u64 = part
                .parse()
                .map_err(|_| VersionError::InvalidComponent {
                    version: text.to_owned(),
                    component: part.to_owned(),
                })?;
            components.push(n);
        }
        Ok(Self {
            raw: text.to_owned(),
            components,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// True when this version's leading components equal `prefix`'s
    /// components exactly ("1.6.2" starts with "1.6", but "1.60.0" does not).
    pub fn starts_with(&self, prefix: &Version) -> bool {
        self.components.len() >= prefix.components.len()
            && self.components[..prefix.components.len()] == prefix.components[..]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A version requirement declared by an application.
///
/// A fully qualified version (three or more components) is an exact
/// requirement; anything shorter is a prefix wildcard selecting the highest
/// matching catalog version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequirement {
    Exact(Version),
    Prefix(Version),
}

impl VersionRequirement {
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let version = Version::parse(text)?;
        if version.components().len() >= 3 {
            Ok(Self::Exact(version))
        } else {
            Ok(Self::Prefix(version))
        }
    }

    /// The version text as the application declared it, used when deriving
    /// the resource locator for a version absent from the catalog.
    pub fn declared_text(&self) -> &str {
        match self {
            Self::Exact(v) | Self::Prefix(v) => v.as_str(),
        }
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        match self {
            Self::Exact(v) => candidate == v,
            Self::Prefix(p) => candidate.starts_with(p),
        }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Prefix(v) => write!(f, "{v}.x"),
        }
    }
}
