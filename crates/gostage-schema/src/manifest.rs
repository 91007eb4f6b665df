use crate::types::{Checksum, DepName};
use crate::version::{Version, VersionRequirement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported manifest_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("family.name must not be empty")]
    EmptyFamilyName,
    #[error("family.url_template must contain a '{{version}}' placeholder: '{0}'")]
    BadUrlTemplate(String),
    #[error("family.default_version is invalid: {0}")]
    BadDefaultVersion(String),
    #[error("dependency entry has an empty name")]
    EmptyDependencyName,
    #[error("dependency '{name}' has invalid version '{version}'")]
    BadDependencyVersion { name: String, version: String },
    #[error("dependency '{name}' {version} has a malformed checksum")]
    BadChecksum { name: String, version: String },
    #[error("dependency '{name}' {version} has unsupported uri '{uri}' (expected https://, http://, or file://)")]
    BadUri {
        name: String,
        version: String,
        uri: String,
    },
    #[error("duplicate dependency entry: ({name}, {version})")]
    DuplicateEntry { name: String, version: String },
}

/// The buildpack's catalog of runtime versions it knows how to provide.
///
/// Loaded once per staging invocation and immutable afterwards; all lookups
/// are in-memory with no I/O.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DependencyManifest {
    pub manifest_version: u32,
    pub family: FamilySection,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FamilySection {
    /// Runtime family name, also the token printed by detect (e.g. "go").
    pub name: DepName,
    /// Origin URL pattern with a `{version}` placeholder, used to derive the
    /// resource locator for versions absent from the catalog.
    pub url_template: String,
    /// Requirement applied when the application does not declare a version.
    pub default_version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DependencyEntry {
    pub name: DepName,
    pub version: String,
    pub uri: String,
    pub checksum: Checksum,
}

impl DependencyEntry {
    /// Parsed form of `version`. Load-time validation guarantees this parses;
    /// callers that hold an entry from a validated manifest can rely on `Ok`.
    pub fn parsed_version(&self) -> Result<Version, crate::version::VersionError> {
        Version::parse(&self.version)
    }
}

impl DependencyManifest {
    /// Exact (name, version) lookup.
    pub fn find_exact(&self, name: &str, version: &Version) -> Option<&DependencyEntry> {
        self.dependencies.iter().find(|e| {
            e.name == name
                && e.parsed_version()
                    .map(|v| v == *version)
                    .unwrap_or(false)
        })
    }

    /// Highest catalog version matching the requirement, or `None`.
    pub fn find_latest(
        &self,
        name: &str,
        requirement: &VersionRequirement,
    ) -> Option<&DependencyEntry> {
        self.dependencies
            .iter()
            .filter(|e| e.name == name)
            .filter_map(|e| e.parsed_version().ok().map(|v| (e, v)))
            .filter(|(_, v)| requirement.matches(v))
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(e, _)| e)
    }

    /// Resource locator a given version would have at the origin, derived
    /// from the family URL template.
    pub fn url_for(&self, version_text: &str) -> String {
        self.family.url_template.replace("{version}", version_text)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.manifest_version != 1 {
            return Err(ManifestError::UnsupportedVersion(self.manifest_version));
        }
        if self.family.name.as_str().is_empty() {
            return Err(ManifestError::EmptyFamilyName);
        }
        if !self.family.url_template.contains("{version}") {
            return Err(ManifestError::BadUrlTemplate(
                self.family.url_template.clone(),
            ));
        }
        if Version::parse(&self.family.default_version).is_err() {
            return Err(ManifestError::BadDefaultVersion(
                self.family.default_version.clone(),
            ));
        }

        let mut seen = BTreeSet::new();
        for entry in &self.dependencies {
            if entry.name.as_str().is_empty() {
                return Err(ManifestError::EmptyDependencyName);
            }
            if entry.parsed_version().is_err() {
                return Err(ManifestError::BadDependencyVersion {
                    name: entry.name.to_string(),
                    version: entry.version.clone(),
                });
            }
            if !entry.checksum.is_well_formed() {
                return Err(ManifestError::BadChecksum {
                    name: entry.name.to_string(),
                    version: entry.version.clone(),
                });
            }
            let scheme_ok = entry.uri.starts_with("https://")
                || entry.uri.starts_with("http://")
                || entry.uri.starts_with("file://");
            if !scheme_ok {
                return Err(ManifestError::BadUri {
                    name: entry.name.to_string(),
                    version: entry.version.clone(),
                    uri: entry.uri.clone(),
                });
            }
            // A corrupt catalog is a load-time fatal error, not a per-request
            // condition.
            if !seen.insert((entry.name.clone(), entry.version.clone())) {
                return Err(ManifestError::DuplicateEntry {
                    name: entry.name.to_string(),
                    version: entry.version.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_manifest_str(input: &str) -> Result<DependencyManifest, ManifestError> {
    let manifest: DependencyManifest = toml::from_str(input)?;
    manifest.validate()?;
    Ok(manifest)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<DependencyManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}
