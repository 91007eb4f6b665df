pub mod compile;
pub mod detect;
pub mod release;

use gostage_schema::DependencyManifest;
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_APPLICABLE: u8 = 2;
pub const EXIT_MANIFEST_ERROR: u8 = 3;

/// Load and validate the dependency manifest. The "manifest error:" prefix
/// is matched by main's exit-code classification.
pub fn load_manifest(path: &Path) -> Result<DependencyManifest, String> {
    gostage_schema::parse_manifest_file(path).map_err(|e| format!("manifest error: {e}"))
}
