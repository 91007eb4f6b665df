//! Application tree classification.

use std::fs;
use std::path::Path;

const LEGACY_MARKER: &str = ".godir";

/// What kind of application the source tree holds. Closed set, matched
/// exhaustively by the orchestrator — adding a variant is a compile error
/// everywhere it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppVariant {
    /// Go sources present; the normal case.
    Native,
    /// Legacy `.godir` layout. Builds through the identical pipeline but
    /// carries a deprecation flag consumed on entering the Detected phase.
    LegacyCompat,
    /// No recognizable markers; staging must not proceed (and must not touch
    /// the network or the catalog).
    NotApplicable,
}

impl AppVariant {
    pub fn is_buildable(self) -> bool {
        !matches!(self, Self::NotApplicable)
    }

    pub fn is_deprecated(self) -> bool {
        matches!(self, Self::LegacyCompat)
    }
}

/// Classify an application tree. Idempotent and side-effect-free.
///
/// The legacy marker wins over native sources: the old platform's apps carry
/// both, and the deprecation warning must fire whenever the marker exists.
pub fn detect(app_root: &Path) -> AppVariant {
    if app_root.join(LEGACY_MARKER).is_file() {
        return AppVariant::LegacyCompat;
    }
    if has_go_sources(app_root) {
        return AppVariant::Native;
    }
    AppVariant::NotApplicable
}

/// Name the built process will run under: the `.godir` content when present
/// (the legacy platform stored the app name there), else the directory name.
pub fn app_name(app_root: &Path) -> String {
    if let Ok(content) = fs::read_to_string(app_root.join(LEGACY_MARKER)) {
        let name = content.trim();
        if !name.is_empty() {
            return name.to_owned();
        }
    }
    app_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_owned())
}

fn has_go_sources(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if has_go_sources(&path) {
                return true;
            }
        } else if name.ends_with(".go") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn app_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn go_sources_detect_as_native() {
        let dir = app_dir();
        fs::write(dir.path().join("main.go"), "package main").unwrap();
        assert_eq!(detect(dir.path()), AppVariant::Native);
    }

    #[test]
    fn nested_go_sources_detect_as_native() {
        let dir = app_dir();
        fs::create_dir_all(dir.path().join("cmd/server")).unwrap();
        fs::write(dir.path().join("cmd/server/main.go"), "package main").unwrap();
        assert_eq!(detect(dir.path()), AppVariant::Native);
    }

    #[test]
    fn godir_only_detects_as_legacy() {
        let dir = app_dir();
        fs::write(dir.path().join(".godir"), "myapp\n").unwrap();
        assert_eq!(detect(dir.path()), AppVariant::LegacyCompat);
    }

    #[test]
    fn godir_wins_over_go_sources() {
        let dir = app_dir();
        fs::write(dir.path().join(".godir"), "myapp\n").unwrap();
        fs::write(dir.path().join("main.go"), "package main").unwrap();
        assert_eq!(detect(dir.path()), AppVariant::LegacyCompat);
    }

    #[test]
    fn empty_tree_is_not_applicable() {
        let dir = app_dir();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();
        assert_eq!(detect(dir.path()), AppVariant::NotApplicable);
    }

    #[test]
    fn detect_is_idempotent() {
        let dir = app_dir();
        fs::write(dir.path().join("main.go"), "package main").unwrap();
        assert_eq!(detect(dir.path()), detect(dir.path()));
    }

    #[test]
    fn hidden_directories_are_ignored() {
        let dir = app_dir();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config.go"), "not source").unwrap();
        assert_eq!(detect(dir.path()), AppVariant::NotApplicable);
    }

    #[test]
    fn variant_predicates() {
        assert!(AppVariant::Native.is_buildable());
        assert!(AppVariant::LegacyCompat.is_buildable());
        assert!(!AppVariant::NotApplicable.is_buildable());
        assert!(AppVariant::LegacyCompat.is_deprecated());
        assert!(!AppVariant::Native.is_deprecated());
    }

    #[test]
    fn app_name_from_godir_content() {
        let dir = app_dir();
        fs::write(dir.path().join(".godir"), "legacy-name\n").unwrap();
        assert_eq!(app_name(dir.path()), "legacy-name");
    }

    #[test]
    fn app_name_falls_back_to_directory() {
        let parent = app_dir();
        let root = parent.path().join("my_go_app");
        fs::create_dir(&root).unwrap();
        assert_eq!(app_name(&root), "my_go_app");
    }
}
