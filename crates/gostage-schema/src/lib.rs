//! Dependency manifest parsing, version model, and requirement matching for gostage.
//!
//! This crate defines the schema layer: TOML dependency manifest parsing
//! (`DependencyManifest`), load-time validation with duplicate rejection,
//! the totally ordered `Version` type with prefix-wildcard requirements
//! (`VersionRequirement`), and string newtypes for checksums and dependency
//! names.

pub mod manifest;
pub mod types;
pub mod version;

pub use manifest::{
    parse_manifest_file, parse_manifest_str, DependencyEntry, DependencyManifest, FamilySection,
    ManifestError,
};
pub use types::{Checksum, DepName};
pub use version::{Version, VersionError, VersionRequirement};
