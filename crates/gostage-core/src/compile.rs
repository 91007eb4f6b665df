//! The compile phase: toolchain installation, vendored dependency builds,
//! and application compilation through a toolchain backend.

use crate::detect::app_name;
use crate::events::{EventSink, StagingEvent};
use crate::toolchain::{CompileSpec, ToolchainBackend, ToolchainError};
use flate2::read::GzDecoder;
use gostage_fetch::LocalArtifact;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Written into the build dir by the compile phase and read back by the
/// release phase; the two run as separate CLI invocations.
pub const STAGING_INFO_FILE: &str = "staging_info.json";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to unpack toolchain archive: {0}")]
    Unpack(String),
    #[error("{0}")]
    DependencyBuild(String),
    #[error("toolchain error: {0}")]
    Toolchain(ToolchainError),
    #[error("compile I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StagingInfo {
    pub app_name: String,
    pub toolchain_version: String,
    pub start_command: String,
    pub staged_at: String,
}

/// A successfully compiled application — the droplet content.
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    pub app_name: String,
    pub binary_path: PathBuf,
    pub build_dir: PathBuf,
    pub start_command: String,
}

fn map_toolchain_error(e: ToolchainError) -> CompileError {
    match e {
        // vendored sub-dependency failures carry the application's own
        // message through to the log, distinct from toolchain failures
        ToolchainError::DependencyBuild(msg) => CompileError::DependencyBuild(msg),
        other => CompileError::Toolchain(other),
    }
}

/// Compile the application against an acquired toolchain artifact.
///
/// Emits the two ordered log-contract events — installation-complete, then
/// the acquisition source description — before any application code builds.
pub fn compile(
    app_root: &Path,
    artifact: &LocalArtifact,
    build_dir: &Path,
    backend: &dyn ToolchainBackend,
    sink: &dyn EventSink,
) -> Result<BuiltArtifact, CompileError> {
    let toolchain_dir = build_dir.join("toolchain");
    unpack_toolchain(&artifact.path, &toolchain_dir)?;
    sink.emit(StagingEvent::Installing {
        name: artifact.entry.name.to_string(),
        version: artifact.entry.version.clone(),
    });
    sink.emit(StagingEvent::Downloaded {
        locator: artifact.locator.clone(),
    });

    let name = app_name(app_root);
    let spec = CompileSpec {
        app_root,
        build_dir,
        toolchain_dir: &toolchain_dir,
        app_name: &name,
    };

    if has_vendored_dependencies(app_root) {
        tracing::debug!("building vendored dependencies for {name}");
        let lines = backend
            .build_dependencies(&spec)
            .map_err(map_toolchain_error)?;
        for line in lines {
            sink.emit(StagingEvent::DependencyOutput { line });
        }
    }

    backend.compile(&spec).map_err(map_toolchain_error)?;

    let start_command = start_command(app_root, &name);
    let info = StagingInfo {
        app_name: name.clone(),
        toolchain_version: artifact.entry.version.clone(),
        start_command: start_command.clone(),
        staged_at: chrono::Utc::now().to_rfc3339(),
    };
    fs::write(
        build_dir.join(STAGING_INFO_FILE),
        serde_json::to_string_pretty(&info)?,
    )?;

    let binary_path = spec.binary_path();
    Ok(BuiltArtifact {
        app_name: name,
        binary_path,
        build_dir: build_dir.to_owned(),
        start_command,
    })
}

fn unpack_toolchain(archive: &Path, dest: &Path) -> Result<(), CompileError> {
    fs::create_dir_all(dest)?;
    let file = fs::File::open(archive)?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball.unpack(dest).map_err(|e| CompileError::Unpack(e.to_string()))?;
    Ok(())
}

fn has_vendored_dependencies(app_root: &Path) -> bool {
    app_root.join("Godeps").join("_workspace").is_dir() || app_root.join("vendor").is_dir()
}

fn start_command(app_root: &Path, app_name: &str) -> String {
    if let Ok(content) = fs::read_to_string(app_root.join("Procfile")) {
        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("web:") {
                let cmd = rest.trim();
                if !cmd.is_empty() {
                    return cmd.to_owned();
                }
            }
        }
    }
    format!("./bin/{app_name}")
}
