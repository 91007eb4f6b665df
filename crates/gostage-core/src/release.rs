//! Release specification: the process-start contract derived from a build.

use crate::compile::{BuiltArtifact, StagingInfo, STAGING_INFO_FILE};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("build directory was never staged: {0}")]
    NotStaged(String),
    #[error("release I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed staging info: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The start specification handed back to the platform after staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpec {
    pub start_command: String,
}

impl ReleaseSpec {
    /// Pure derivation from a successful build.
    pub fn from_artifact(built: &BuiltArtifact) -> Self {
        Self {
            start_command: built.start_command.clone(),
        }
    }

    /// Reconstruct the spec from a build dir written by the compile phase.
    /// Fails if the dir was never staged — a usage error, not a staging
    /// outcome.
    pub fn from_build_dir(build_dir: &Path) -> Result<Self, ReleaseError> {
        let info_path = build_dir.join(STAGING_INFO_FILE);
        if !info_path.is_file() {
            return Err(ReleaseError::NotStaged(build_dir.display().to_string()));
        }
        let info: StagingInfo = serde_json::from_str(&fs::read_to_string(&info_path)?)?;
        Ok(Self {
            start_command: info.start_command,
        })
    }

    /// The fixed YAML document the platform parses for process types.
    pub fn render_yaml(&self) -> String {
        format!(
            "---\ndefault_process_types:\n  web: {}\n",
            self.start_command
        )
    }
}
