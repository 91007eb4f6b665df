use super::EXIT_SUCCESS;
use gostage_core::ReleaseSpec;
use std::path::Path;

/// Print the process-start specification for a previously staged build dir.
pub fn run(build_dir: &Path) -> Result<u8, String> {
    let spec = ReleaseSpec::from_build_dir(build_dir).map_err(|e| e.to_string())?;
    print!("{}", spec.render_yaml());
    Ok(EXIT_SUCCESS)
}
