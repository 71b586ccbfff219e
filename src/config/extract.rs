use crate::locator::LocatorParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExtractOutputConfig {
    /// Where the rectified region is written (PNG or JPEG by extension).
    pub region_path: PathBuf,
    /// Optional JSON report with the detected corners and timings.
    #[serde(default)]
    pub json_out: Option<PathBuf>,
    /// Optional grayscale dump of the pyramid level the detector ran on.
    #[serde(default)]
    pub detector_view: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExtractToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub params: LocatorParams,
    /// Standalone params JSON; replaces `params` when set.
    #[serde(default)]
    pub params_file: Option<PathBuf>,
    pub output: ExtractOutputConfig,
}

impl ExtractToolConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut config: Self = super::load_config(path)?;
        super::resolve_params(&mut config.params, config.params_file.as_deref(), path)?;
        Ok(config)
    }
}
