use gostage_schema::DependencyManifest;
use std::path::PathBuf;

/// Environment flag selecting isolated acquisition. Read once at context
/// construction, never re-checked mid-run.
pub const OFFLINE_ENV: &str = "GOSTAGE_OFFLINE";

/// Whether the staging run may reach the network for uncached dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// All dependencies must already be in the local cache; network access
    /// is forbidden.
    Isolated,
    /// Uncached dependencies may be fetched from their source locator.
    Online,
}

impl OperatingMode {
    /// Resolve the mode from an explicit CLI request plus the environment
    /// flag. Either one forces isolation.
    pub fn from_env(offline_flag: bool) -> Self {
        let env_isolated = std::env::var(OFFLINE_ENV).map(|v| v == "1").unwrap_or(false);
        if offline_flag || env_isolated {
            Self::Isolated
        } else {
            Self::Online
        }
    }

    pub fn is_isolated(self) -> bool {
        matches!(self, Self::Isolated)
    }
}

/// Everything a staging run needs, constructed once at staging start and
/// passed by reference through all components. Never a global.
#[derive(Debug)]
pub struct StagingContext {
    pub app_root: PathBuf,
    pub mode: OperatingMode,
    pub cache_root: PathBuf,
    pub manifest: DependencyManifest,
}

impl StagingContext {
    pub fn new(
        app_root: impl Into<PathBuf>,
        mode: OperatingMode,
        cache_root: impl Into<PathBuf>,
        manifest: DependencyManifest,
    ) -> Self {
        Self {
            app_root: app_root.into(),
            mode,
            cache_root: cache_root.into(),
            manifest,
        }
    }
}
