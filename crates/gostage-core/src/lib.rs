//! Staging pipeline for gostage.
//!
//! This crate ties together the schema, store, and fetch layers into the
//! staging orchestrator: application detection, version requirement
//! resolution, dependency acquisition, compilation through a pluggable
//! toolchain backend, and release specification generation, sequenced as a
//! strict state machine with typed terminal failures.

pub mod compile;
pub mod concurrency;
pub mod context;
pub mod detect;
pub mod events;
pub mod release;
pub mod resolve;
pub mod staging;
pub mod toolchain;

pub use compile::{compile, BuiltArtifact, CompileError, StagingInfo, STAGING_INFO_FILE};
pub use concurrency::{install_signal_handler, shutdown_requested};
pub use context::{OperatingMode, StagingContext, OFFLINE_ENV};
pub use detect::{app_name, detect, AppVariant};
pub use events::{EventSink, MemorySink, StagingEvent, StdoutSink};
pub use release::{ReleaseError, ReleaseSpec};
pub use resolve::{requirement_from_app, resolve, RequirementError, ResolveError};
pub use staging::{validate_transition, FailureKind, Stager, StagingOutcome, StagingPhase};
pub use toolchain::{
    select_toolchain, CompileSpec, MockToolchain, ProcessToolchain, ToolchainBackend,
    ToolchainError,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("manifest error: {0}")]
    Manifest(#[from] gostage_schema::ManifestError),
    #[error("cache error: {0}")]
    Store(#[from] gostage_store::StoreError),
    #[error("acquisition error: {0}")]
    Acquire(#[from] gostage_fetch::AcquireError),
    #[error("{0}")]
    Resolve(#[from] resolve::ResolveError),
    #[error("requirement error: {0}")]
    Requirement(#[from] resolve::RequirementError),
    #[error("compile error: {0}")]
    Compile(#[from] compile::CompileError),
    #[error("release error: {0}")]
    Release(#[from] release::ReleaseError),
    #[error("invalid staging transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
