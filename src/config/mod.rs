//! JSON configurations of the command-line tools.

pub mod extract;
pub mod locate;

use crate::locator::LocatorParams;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read a tool config from `path`.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

/// Validated tool params: those in `params_file` when it is set, otherwise
/// the inline `params` block of the config at `config_path`.
pub(crate) fn resolve_params(
    params: &mut LocatorParams,
    params_file: Option<&Path>,
    config_path: &Path,
) -> Result<(), String> {
    match params_file {
        Some(file) => *params = LocatorParams::from_json_file(file)?,
        None => params
            .validate()
            .map_err(|e| format!("Invalid params in {}: {e}", config_path.display()))?,
    }
    Ok(())
}
