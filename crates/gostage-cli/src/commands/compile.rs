use super::{load_manifest, EXIT_FAILURE, EXIT_SUCCESS};
use gostage_core::{select_toolchain, OperatingMode, Stager, StagingContext, StdoutSink};
use gostage_fetch::{DependencySource, HttpSource, HttpUpstreamIndex, UpstreamIndex};
use std::path::Path;

pub struct CompileOptions<'a> {
    pub manifest_path: &'a Path,
    pub cache_root: &'a Path,
    pub offline: bool,
    pub toolchain: &'a str,
}

/// Stage an application into the build directory.
///
/// All contract output (progress lines, failure detail, the staging-failed
/// line) is emitted through the stdout sink during the run, so a staging
/// failure returns its exit code without printing anything further.
pub fn run(app_dir: &Path, build_dir: &Path, opts: &CompileOptions<'_>) -> Result<u8, String> {
    let manifest = load_manifest(opts.manifest_path)?;
    let mode = OperatingMode::from_env(opts.offline);
    tracing::debug!("staging in {mode:?} mode");

    let ctx = StagingContext::new(app_dir, mode, opts.cache_root, manifest);
    let backend = select_toolchain(opts.toolchain).map_err(|e| e.to_string())?;
    let sink = StdoutSink;

    // The HTTP client only exists in online mode; isolated runs never
    // construct a network capability at all.
    let http_source;
    let http_upstream;
    let (source, upstream): (Option<&dyn DependencySource>, Option<&dyn UpstreamIndex>) =
        if mode.is_isolated() {
            (None, None)
        } else {
            http_source = HttpSource::new();
            http_upstream = HttpUpstreamIndex::new();
            (Some(&http_source), Some(&http_upstream))
        };

    let stager = Stager::new(&ctx, source, upstream, backend.as_ref(), &sink);
    let outcome = stager.stage(build_dir);
    if outcome.is_success() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}
