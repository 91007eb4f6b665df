//! CLI subprocess integration tests.
//!
//! These tests invoke the `gostage` binary as a subprocess and verify the
//! platform contract: exit codes, the detect name token, the exact staging
//! log lines, and the release YAML.

use std::path::{Path, PathBuf};
use std::process::Command;

fn gostage_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gostage"));
    // The mock toolchain backend stands in for a runnable Go toolchain.
    cmd.env_remove("GOSTAGE_OFFLINE");
    cmd
}

fn toolchain_tarball() -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let data = b"#!/bin/sh\necho go version\n";
    let mut header = tar::Header::new_gnu();
    header.set_path("go/bin/go").unwrap();
    header.set_size(data.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder.append(&header, &data[..]).unwrap();
    let encoder = builder.into_inner().unwrap();
    encoder.finish().unwrap()
}

/// A staging fixture: a dependency mirror served over `file://`, a manifest
/// pointing at it, and an application tree.
struct Fixture {
    root: tempfile::TempDir,
    manifest: PathBuf,
    cache: PathBuf,
    app: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let tarball = toolchain_tarball();
        let checksum = gostage_store::content_checksum(&tarball);

        let mirror = root.path().join("mirror");
        std::fs::create_dir_all(&mirror).unwrap();
        let artifact = mirror.join("go1.6.2.linux-amd64.tar.gz");
        std::fs::write(&artifact, &tarball).unwrap();

        let manifest = root.path().join("manifest.toml");
        std::fs::write(
            &manifest,
            format!(
                r#"
manifest_version = 1

[family]
name = "go"
url_template = "https://storage.googleapis.com/golang/go{{version}}.linux-amd64.tar.gz"
default_version = "1.6"

[[dependencies]]
name = "go"
version = "1.6.2"
uri = "file://{artifact}"
checksum = "{checksum}"
"#,
                artifact = artifact.display()
            ),
        )
        .unwrap();

        let app = root.path().join("go_app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("main.go"), "package main").unwrap();

        let cache = root.path().join("cache-root");
        Self {
            root,
            manifest,
            cache,
            app,
        }
    }

    fn compile(&self, build_dir: &Path, offline: bool) -> std::process::Output {
        let mut cmd = gostage_bin();
        cmd.args([
            "--manifest",
            &self.manifest.to_string_lossy(),
            "--cache",
            &self.cache.to_string_lossy(),
            "--toolchain",
            "mock",
        ]);
        if offline {
            cmd.arg("--offline");
        }
        cmd.args([
            "compile",
            &self.app.to_string_lossy(),
            &build_dir.to_string_lossy(),
        ])
        .output()
        .unwrap()
    }
}

#[test]
fn cli_version_exits_zero() {
    let output = gostage_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "gostage --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("gostage"),
        "version output must contain 'gostage': {stdout}"
    );
}

#[test]
fn cli_help_lists_phases() {
    let output = gostage_bin().arg("--help").output().unwrap();
    assert!(output.status.success(), "gostage --help must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("detect"), "help must list 'detect'");
    assert!(stdout.contains("compile"), "help must list 'compile'");
    assert!(stdout.contains("release"), "help must list 'release'");
}

#[test]
fn detect_prints_name_token_for_go_app() {
    let fx = Fixture::new();
    let output = gostage_bin()
        .args([
            "--manifest",
            &fx.manifest.to_string_lossy(),
            "detect",
            &fx.app.to_string_lossy(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "go");
}

#[test]
fn detect_rejects_non_go_app_without_token() {
    let fx = Fixture::new();
    let other = fx.root.path().join("static_site");
    std::fs::create_dir_all(&other).unwrap();
    std::fs::write(other.join("index.html"), "<html>").unwrap();

    let output = gostage_bin()
        .args([
            "--manifest",
            &fx.manifest.to_string_lossy(),
            "detect",
            &other.to_string_lossy(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn compile_online_stages_and_release_prints_yaml() {
    let fx = Fixture::new();
    let build = fx.root.path().join("build");

    let output = fx.compile(&build, false);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "compile must exit 0. stdout: {stdout} stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Installing go1.6.2... done"));
    assert!(stdout.contains("Downloaded [file://"));
    assert!(stdout.contains("Uploading droplet"));
    assert!(build.join("bin/go_app").is_file());
    assert!(build.join("staging_info.json").is_file());

    let release = gostage_bin()
        .args(["release", &build.to_string_lossy()])
        .output()
        .unwrap();
    assert!(release.status.success());
    assert_eq!(
        String::from_utf8_lossy(&release.stdout),
        "---\ndefault_process_types:\n  web: ./bin/go_app\n"
    );
}

#[test]
fn compile_offline_with_primed_cache_succeeds() {
    let fx = Fixture::new();

    // online run primes the shared cache root
    let warm_build = fx.root.path().join("build-warm");
    assert!(fx.compile(&warm_build, false).status.success());

    let build = fx.root.path().join("build-offline");
    let output = fx.compile(&build, true);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "offline compile with warm cache must succeed: {stdout}"
    );
    assert!(stdout.contains("Installing go1.6.2... done"));
    assert!(stdout.contains("Downloaded [file://"));
}

#[test]
fn compile_offline_with_cold_cache_fails_without_upload() {
    let fx = Fixture::new();
    let build = fx.root.path().join("build");

    let output = fx.compile(&build, true);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("App staging failed in the buildpack compile phase"));
    assert!(!stdout.contains("Uploading droplet"));
}

#[test]
fn compile_unknown_version_reports_buildpack_gap() {
    let fx = Fixture::new();
    std::fs::create_dir_all(fx.app.join("Godeps")).unwrap();
    std::fs::write(
        fx.app.join("Godeps/Godeps.json"),
        r#"{"GoVersion": "go99.99.99"}"#,
    )
    .unwrap();

    let build = fx.root.path().join("build");
    let output = fx.compile(&build, true);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains(
        "Resource https://storage.googleapis.com/golang/go99.99.99.linux-amd64.tar.gz \
         is not provided by this buildpack. Please upgrade your buildpack to receive \
         the latest resources."
    ));
    assert!(!stdout.contains("Uploading droplet"));
}

#[test]
fn compile_legacy_godir_app_warns_and_succeeds() {
    let fx = Fixture::new();
    std::fs::remove_file(fx.app.join("main.go")).unwrap();
    std::fs::write(fx.app.join(".godir"), "legacy_app\n").unwrap();

    let build = fx.root.path().join("build");
    let output = fx.compile(&build, false);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    let warnings = stdout
        .lines()
        .filter(|l| *l == "Deprecated, .godir file found!")
        .count();
    assert_eq!(warnings, 1);
    assert!(build.join("bin/legacy_app").is_file());
}

#[test]
fn corrupt_manifest_is_a_manifest_error() {
    let fx = Fixture::new();
    std::fs::write(&fx.manifest, "not toml at all [[[").unwrap();

    let build = fx.root.path().join("build");
    let output = fx.compile(&build, false);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn release_of_unstaged_dir_fails() {
    let fx = Fixture::new();
    let build = fx.root.path().join("never-staged");
    std::fs::create_dir_all(&build).unwrap();

    let output = gostage_bin()
        .args(["release", &build.to_string_lossy()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}
