//! Pluggable toolchain backends for the compile phase.
//!
//! The `process` backend invokes the acquired Go toolchain as a subprocess;
//! the `mock` backend stands in for it in tests and environments without a
//! runnable toolchain.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("unknown toolchain backend: {0}")]
    BackendUnavailable(String),
    #[error("toolchain binary not found at {0}")]
    MissingToolchain(PathBuf),
    #[error("{0}")]
    DependencyBuild(String),
    #[error("compile failed: {0}")]
    CompileFailed(String),
    #[error("toolchain I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inputs to a toolchain invocation.
#[derive(Debug, Clone, Copy)]
pub struct CompileSpec<'a> {
    pub app_root: &'a Path,
    pub build_dir: &'a Path,
    /// Directory the acquired toolchain archive was unpacked into; the `go`
    /// tree lives directly beneath it.
    pub toolchain_dir: &'a Path,
    pub app_name: &'a str,
}

impl CompileSpec<'_> {
    pub fn binary_path(&self) -> PathBuf {
        self.build_dir.join("bin").join(self.app_name)
    }
}

pub trait ToolchainBackend {
    fn name(&self) -> &str;

    /// Build the application's vendored sub-dependencies, returning their
    /// output lines for passthrough to the staging log.
    fn build_dependencies(&self, spec: &CompileSpec<'_>) -> Result<Vec<String>, ToolchainError>;

    /// Compile the application into `spec.binary_path()`.
    fn compile(&self, spec: &CompileSpec<'_>) -> Result<(), ToolchainError>;
}

pub fn select_toolchain(name: &str) -> Result<Box<dyn ToolchainBackend>, ToolchainError> {
    match name {
        "process" => Ok(Box::new(ProcessToolchain)),
        "mock" => Ok(Box::new(MockToolchain)),
        other => Err(ToolchainError::BackendUnavailable(other.to_owned())),
    }
}

/// Runs the real acquired toolchain as a subprocess.
pub struct ProcessToolchain;

impl ProcessToolchain {
    fn go_binary(spec: &CompileSpec<'_>) -> Result<PathBuf, ToolchainError> {
        let bin = spec.toolchain_dir.join("go").join("bin").join("go");
        if !bin.is_file() {
            return Err(ToolchainError::MissingToolchain(bin));
        }
        Ok(bin)
    }

    fn base_command(bin: &Path, spec: &CompileSpec<'_>) -> Command {
        let goroot = spec.toolchain_dir.join("go");
        let gopath = spec.build_dir.join("gopath");
        let mut cmd = Command::new(bin);
        cmd.current_dir(spec.app_root)
            .env("GOROOT", &goroot)
            .env("GOPATH", &gopath);
        cmd
    }

    fn workspace_gopath(spec: &CompileSpec<'_>) -> Option<PathBuf> {
        let workspace = spec.app_root.join("Godeps").join("_workspace");
        workspace.is_dir().then_some(workspace)
    }
}

impl ToolchainBackend for ProcessToolchain {
    fn name(&self) -> &str {
        "process"
    }

    fn build_dependencies(&self, spec: &CompileSpec<'_>) -> Result<Vec<String>, ToolchainError> {
        let bin = Self::go_binary(spec)?;
        std::fs::create_dir_all(spec.build_dir.join("gopath"))?;

        let mut cmd = Self::base_command(&bin, spec);
        if let Some(workspace) = Self::workspace_gopath(spec) {
            let gopath = format!(
                "{}:{}",
                workspace.display(),
                spec.build_dir.join("gopath").display()
            );
            cmd.env("GOPATH", gopath);
        }
        let output = cmd.args(["build", "./..."]).output()?;
        if !output.status.success() {
            return Err(ToolchainError::DependencyBuild(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(ToOwned::to_owned)
            .collect())
    }

    fn compile(&self, spec: &CompileSpec<'_>) -> Result<(), ToolchainError> {
        let bin = Self::go_binary(spec)?;
        std::fs::create_dir_all(spec.build_dir.join("bin"))?;
        std::fs::create_dir_all(spec.build_dir.join("gopath"))?;

        let output = Self::base_command(&bin, spec)
            .args(["build", "-o"])
            .arg(spec.binary_path())
            .arg(".")
            .output()?;
        if !output.status.success() {
            return Err(ToolchainError::CompileFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }
        Ok(())
    }
}

/// Test double. Honors a few marker files in the application root:
/// `.mock-compile-fail`, `.mock-dependency-fail`, and
/// `.mock-dependency-output` (one passthrough line per line of content).
pub struct MockToolchain;

const MOCK_COMPILE_FAIL: &str = ".mock-compile-fail";
const MOCK_DEPENDENCY_FAIL: &str = ".mock-dependency-fail";
const MOCK_DEPENDENCY_OUTPUT: &str = ".mock-dependency-output";

impl ToolchainBackend for MockToolchain {
    fn name(&self) -> &str {
        "mock"
    }

    fn build_dependencies(&self, spec: &CompileSpec<'_>) -> Result<Vec<String>, ToolchainError> {
        let fail_marker = spec.app_root.join(MOCK_DEPENDENCY_FAIL);
        if fail_marker.is_file() {
            let msg = std::fs::read_to_string(&fail_marker)?;
            let msg = msg.trim();
            return Err(ToolchainError::DependencyBuild(if msg.is_empty() {
                "mock dependency build failure".to_owned()
            } else {
                msg.to_owned()
            }));
        }
        let output_marker = spec.app_root.join(MOCK_DEPENDENCY_OUTPUT);
        if output_marker.is_file() {
            let content = std::fs::read_to_string(&output_marker)?;
            return Ok(content.lines().map(ToOwned::to_owned).collect());
        }
        Ok(Vec::new())
    }

    fn compile(&self, spec: &CompileSpec<'_>) -> Result<(), ToolchainError> {
        if spec.app_root.join(MOCK_COMPILE_FAIL).is_file() {
            return Err(ToolchainError::CompileFailed(
                "mock compile failure".to_owned(),
            ));
        }
        std::fs::create_dir_all(spec.build_dir.join("bin"))?;
        std::fs::write(
            spec.binary_path(),
            format!("#!/bin/sh\necho {}\n", spec.app_name),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_dirs() -> (tempfile::TempDir, tempfile::TempDir, tempfile::TempDir) {
        (
            tempfile::tempdir().unwrap(),
            tempfile::tempdir().unwrap(),
            tempfile::tempdir().unwrap(),
        )
    }

    #[test]
    fn select_valid_backends() {
        assert_eq!(select_toolchain("process").unwrap().name(), "process");
        assert_eq!(select_toolchain("mock").unwrap().name(), "mock");
    }

    #[test]
    fn select_invalid_backend_fails() {
        assert!(matches!(
            select_toolchain("nonexistent"),
            Err(ToolchainError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn mock_compile_places_binary() {
        let (app, build, tool) = spec_dirs();
        let spec = CompileSpec {
            app_root: app.path(),
            build_dir: build.path(),
            toolchain_dir: tool.path(),
            app_name: "my_app",
        };
        MockToolchain.compile(&spec).unwrap();
        assert!(spec.binary_path().is_file());
    }

    #[test]
    fn mock_compile_fail_marker() {
        let (app, build, tool) = spec_dirs();
        std::fs::write(app.path().join(".mock-compile-fail"), "").unwrap();
        let spec = CompileSpec {
            app_root: app.path(),
            build_dir: build.path(),
            toolchain_dir: tool.path(),
            app_name: "my_app",
        };
        assert!(matches!(
            MockToolchain.compile(&spec),
            Err(ToolchainError::CompileFailed(_))
        ));
    }

    #[test]
    fn mock_dependency_output_passthrough() {
        let (app, build, tool) = spec_dirs();
        std::fs::write(
            app.path().join(".mock-dependency-output"),
            "Hello from foo!\n",
        )
        .unwrap();
        let spec = CompileSpec {
            app_root: app.path(),
            build_dir: build.path(),
            toolchain_dir: tool.path(),
            app_name: "my_app",
        };
        let lines = MockToolchain.build_dependencies(&spec).unwrap();
        assert_eq!(lines, vec!["Hello from foo!".to_owned()]);
    }

    #[test]
    fn mock_dependency_fail_carries_message() {
        let (app, build, tool) = spec_dirs();
        std::fs::write(
            app.path().join(".mock-dependency-fail"),
            "package foo does not build\n",
        )
        .unwrap();
        let spec = CompileSpec {
            app_root: app.path(),
            build_dir: build.path(),
            toolchain_dir: tool.path(),
            app_name: "my_app",
        };
        let err = MockToolchain.build_dependencies(&spec).unwrap_err();
        assert!(err.to_string().contains("package foo does not build"));
    }

    #[test]
    fn process_backend_requires_toolchain_binary() {
        let (app, build, tool) = spec_dirs();
        let spec = CompileSpec {
            app_root: app.path(),
            build_dir: build.path(),
            toolchain_dir: tool.path(),
            app_name: "my_app",
        };
        assert!(matches!(
            ProcessToolchain.compile(&spec),
            Err(ToolchainError::MissingToolchain(_))
        ));
    }

    #[test]
    fn binary_path_is_under_build_bin() {
        let (app, build, tool) = spec_dirs();
        let spec = CompileSpec {
            app_root: app.path(),
            build_dir: build.path(),
            toolchain_dir: tool.path(),
            app_name: "web_app",
        };
        assert_eq!(spec.binary_path(), build.path().join("bin").join("web_app"));
    }
}
