use super::{load_manifest, EXIT_NOT_APPLICABLE, EXIT_SUCCESS};
use gostage_core::{detect, AppVariant};
use std::path::Path;

/// Classify the application tree. Prints the family name token and exits 0
/// when buildable; exits non-zero with no token otherwise. The manifest is
/// only consulted on the success path — a not-my-app answer touches nothing.
pub fn run(app_dir: &Path, manifest_path: &Path) -> Result<u8, String> {
    match detect(app_dir) {
        AppVariant::NotApplicable => Ok(EXIT_NOT_APPLICABLE),
        AppVariant::Native | AppVariant::LegacyCompat => {
            let manifest = load_manifest(manifest_path)?;
            println!("{}", manifest.family.name);
            Ok(EXIT_SUCCESS)
        }
    }
}
