//! Version requirement extraction and resolution against the catalog.
//!
//! The two resolution failures carry different user-facing messages because
//! they imply different remediation: a catalog gap means the operator should
//! upgrade the buildpack, while a version absent at the origin means the
//! application declared an impossible requirement. The wording of both is a
//! platform contract and must not drift.

use gostage_fetch::UpstreamIndex;
use gostage_schema::{
    DependencyEntry, DependencyManifest, FamilySection, VersionError, VersionRequirement,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Resource {uri} is not provided by this buildpack. Please upgrade your buildpack to receive the latest resources.")]
    NotSupportedByBuildpack { uri: String },
    #[error("Resource {uri} does not exist.")]
    NotFoundUpstream { uri: String },
}

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },
    #[error("malformed Godeps/Godeps.json: {0}")]
    BadGodeps(#[from] serde_json::Error),
    #[error("invalid version requirement: {0}")]
    BadVersion(#[from] VersionError),
}

const GODEPS_FILE: &str = "Godeps/Godeps.json";

#[derive(Debug, Deserialize)]
struct GodepsFile {
    #[serde(rename = "GoVersion")]
    go_version: Option<String>,
}

/// Derive the application's version requirement, once per staging run.
///
/// `Godeps/Godeps.json` declares e.g. `"GoVersion": "go1.6.2"` (exact) or
/// `"go1.6"` (prefix). Apps without a declaration get the family default.
pub fn requirement_from_app(
    app_root: &Path,
    family: &FamilySection,
) -> Result<VersionRequirement, RequirementError> {
    let godeps_path = app_root.join(GODEPS_FILE);
    if godeps_path.is_file() {
        let content = fs::read_to_string(&godeps_path).map_err(|source| RequirementError::Io {
            file: GODEPS_FILE.to_owned(),
            source,
        })?;
        let godeps: GodepsFile = serde_json::from_str(&content)?;
        if let Some(declared) = godeps.go_version {
            let text = declared
                .strip_prefix(family.name.as_str())
                .unwrap_or(&declared);
            return Ok(VersionRequirement::parse(text)?);
        }
    }
    Ok(VersionRequirement::parse(&family.default_version)?)
}

/// Resolve a requirement to exactly one catalog entry, or a typed failure.
///
/// `upstream` is the online-only existence probe; isolated runs pass `None`
/// and therefore can never produce `NotFoundUpstream`.
pub fn resolve<'m>(
    manifest: &'m DependencyManifest,
    requirement: &VersionRequirement,
    upstream: Option<&dyn UpstreamIndex>,
) -> Result<&'m DependencyEntry, ResolveError> {
    let name = manifest.family.name.as_str();
    let found = match requirement {
        VersionRequirement::Exact(version) => manifest.find_exact(name, version),
        VersionRequirement::Prefix(_) => manifest.find_latest(name, requirement),
    };
    if let Some(entry) = found {
        tracing::debug!("resolved {name} {requirement} -> {}", entry.version);
        return Ok(entry);
    }

    let uri = manifest.url_for(requirement.declared_text());
    match upstream {
        None => Err(ResolveError::NotSupportedByBuildpack { uri }),
        Some(index) => match index.exists(&uri) {
            Ok(false) => Err(ResolveError::NotFoundUpstream { uri }),
            Ok(true) => Err(ResolveError::NotSupportedByBuildpack { uri }),
            Err(e) => {
                // Nothing was confirmed about the origin; report the
                // conservative catalog-gap failure.
                tracing::warn!("upstream existence probe failed: {e}");
                Err(ResolveError::NotSupportedByBuildpack { uri })
            }
        },
    }
}
