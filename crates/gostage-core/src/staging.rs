//! The staging orchestrator: a strict state machine sequencing detection,
//! resolution, acquisition, compilation, and release generation.
//!
//! Every component failure is captured as a typed result and translated into
//! exactly one terminal `FailureKind`; no component recovers from another's
//! failure silently.

use crate::compile::{compile, BuiltArtifact, CompileError};
use crate::context::StagingContext;
use crate::detect::{detect, AppVariant};
use crate::events::{EventSink, StagingEvent};
use crate::release::ReleaseSpec;
use crate::resolve::{requirement_from_app, resolve, ResolveError};
use crate::toolchain::ToolchainBackend;
use crate::StagingError;
use gostage_fetch::{acquire, AcquireError, DependencySource, UpstreamIndex};
use gostage_store::{CacheLayout, CacheStore};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingPhase {
    Start,
    Detected,
    VersionResolved,
    Acquired,
    Compiled,
    Released,
    Failed,
}

impl fmt::Display for StagingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Detected => "detected",
            Self::VersionResolved => "version-resolved",
            Self::Acquired => "acquired",
            Self::Compiled => "compiled",
            Self::Released => "released",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub fn validate_transition(from: StagingPhase, to: StagingPhase) -> Result<(), StagingError> {
    use StagingPhase::{Acquired, Compiled, Detected, Failed, Released, Start, VersionResolved};

    let valid = matches!(
        (from, to),
        (Start, Detected)
            | (Detected, VersionResolved)
            | (VersionResolved, Acquired)
            | (Acquired, Compiled)
            | (Compiled, Released)
            | (
                Start | Detected | VersionResolved | Acquired | Compiled,
                Failed
            )
    );

    if valid {
        Ok(())
    } else {
        Err(StagingError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Terminal failure classification. Each kind carries the user-visible
/// message the platform contract requires for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NoApplicableApp,
    NotSupportedByBuildpack,
    NotFoundUpstream,
    CacheMiss,
    Integrity,
    Timeout,
    DependencyBuild,
    Compile,
}

/// Terminal node of a staging run. No partial-success state exists.
#[derive(Debug)]
pub enum StagingOutcome {
    Success {
        droplet: BuiltArtifact,
        release: ReleaseSpec,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl StagingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

fn kind_for_resolve(e: &ResolveError) -> FailureKind {
    match e {
        ResolveError::NotSupportedByBuildpack { .. } => FailureKind::NotSupportedByBuildpack,
        ResolveError::NotFoundUpstream { .. } => FailureKind::NotFoundUpstream,
    }
}

fn kind_for_acquire(e: &AcquireError) -> FailureKind {
    match e {
        AcquireError::CacheMiss { .. } => FailureKind::CacheMiss,
        AcquireError::Integrity { .. } => FailureKind::Integrity,
        AcquireError::Timeout { .. } => FailureKind::Timeout,
        AcquireError::Fetch(_) | AcquireError::Store(_) => FailureKind::Compile,
    }
}

fn kind_for_compile(e: &CompileError) -> FailureKind {
    match e {
        CompileError::DependencyBuild(_) => FailureKind::DependencyBuild,
        CompileError::Unpack(_)
        | CompileError::Toolchain(_)
        | CompileError::Io(_)
        | CompileError::Serialization(_) => FailureKind::Compile,
    }
}

/// Sequences one staging run over a constructed context.
///
/// In isolated mode any injected network capability is discarded at
/// construction, so the no-network invariant holds by the shape of the data
/// rather than by runtime checks scattered through the pipeline.
pub struct Stager<'a> {
    ctx: &'a StagingContext,
    source: Option<&'a dyn DependencySource>,
    upstream: Option<&'a dyn UpstreamIndex>,
    backend: &'a dyn ToolchainBackend,
    sink: &'a dyn EventSink,
}

impl<'a> Stager<'a> {
    pub fn new(
        ctx: &'a StagingContext,
        source: Option<&'a dyn DependencySource>,
        upstream: Option<&'a dyn UpstreamIndex>,
        backend: &'a dyn ToolchainBackend,
        sink: &'a dyn EventSink,
    ) -> Self {
        let (source, upstream) = if ctx.mode.is_isolated() {
            (None, None)
        } else {
            (source, upstream)
        };
        Self {
            ctx,
            source,
            upstream,
            backend,
            sink,
        }
    }

    /// Run the full pipeline, emitting contract events along the way.
    pub fn stage(&self, build_dir: &Path) -> StagingOutcome {
        match self.run(build_dir) {
            Ok((droplet, release)) => {
                self.sink.emit(StagingEvent::UploadingDroplet);
                StagingOutcome::Success { droplet, release }
            }
            Err((kind, message)) => {
                tracing::debug!("staging failed ({kind:?}): {message}");
                self.sink.emit(StagingEvent::FailureDetail {
                    message: message.clone(),
                });
                self.sink.emit(StagingEvent::StagingFailed);
                StagingOutcome::Failed { kind, message }
            }
        }
    }

    fn run(
        &self,
        build_dir: &Path,
    ) -> Result<(BuiltArtifact, ReleaseSpec), (FailureKind, String)> {
        let mut phase = StagingPhase::Start;

        let variant = detect(&self.ctx.app_root);
        advance(&mut phase, StagingPhase::Detected);
        match variant {
            AppVariant::NotApplicable => {
                // fail before touching the catalog or any acquisition path
                return Err((
                    FailureKind::NoApplicableApp,
                    "no buildable application found".to_owned(),
                ));
            }
            AppVariant::LegacyCompat => self.sink.emit(StagingEvent::DeprecatedGodir),
            AppVariant::Native => {}
        }

        let requirement = requirement_from_app(&self.ctx.app_root, &self.ctx.manifest.family)
            .map_err(|e| (FailureKind::Compile, e.to_string()))?;
        let entry = resolve(&self.ctx.manifest, &requirement, self.upstream)
            .map_err(|e| (kind_for_resolve(&e), e.to_string()))?
            .clone();
        advance(&mut phase, StagingPhase::VersionResolved);
        tracing::info!("staging with {} {}", entry.name, entry.version);

        let layout = CacheLayout::new(&self.ctx.cache_root);
        layout
            .initialize()
            .map_err(|e| (FailureKind::Compile, e.to_string()))?;
        let cache = CacheStore::new(layout);
        let artifact = acquire(&entry, &cache, self.source)
            .map_err(|e| (kind_for_acquire(&e), e.to_string()))?;
        advance(&mut phase, StagingPhase::Acquired);

        let droplet = compile(
            &self.ctx.app_root,
            &artifact,
            build_dir,
            self.backend,
            self.sink,
        )
        .map_err(|e| (kind_for_compile(&e), e.to_string()))?;
        advance(&mut phase, StagingPhase::Compiled);

        let release = ReleaseSpec::from_artifact(&droplet);
        advance(&mut phase, StagingPhase::Released);
        Ok((droplet, release))
    }
}

fn advance(phase: &mut StagingPhase, next: StagingPhase) {
    debug_assert!(
        validate_transition(*phase, next).is_ok(),
        "invalid staging transition: {phase} -> {next}"
    );
    *phase = next;
}
