use crate::locator::LocatorParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One piece image to locate.
#[derive(Clone, Debug, Deserialize)]
pub struct PieceInput {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocateOutputConfig {
    pub json_out: Option<PathBuf>,
    /// Also write the reference region that was indexed.
    pub region_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LocateToolConfig {
    /// Reference image (a photo of the box, or an already cropped picture).
    pub puzzle: PathBuf,
    #[serde(default = "default_puzzle_id")]
    pub puzzle_id: String,
    /// Run region extraction on `puzzle` before indexing it.
    #[serde(default)]
    pub extract_region: bool,
    pub pieces: Vec<PieceInput>,
    #[serde(default)]
    pub params: LocatorParams,
    /// Standalone params JSON; replaces `params` when set.
    #[serde(default)]
    pub params_file: Option<PathBuf>,
    #[serde(default)]
    pub output: LocateOutputConfig,
}

fn default_puzzle_id() -> String {
    "puzzle".to_string()
}

impl LocateToolConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut config: Self = super::load_config(path)?;
        super::resolve_params(&mut config.params, config.params_file.as_deref(), path)?;
        if config.pieces.is_empty() {
            return Err(format!("No pieces listed in {}", path.display()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_piece_list() {
        let json = r#"{
            "puzzle": "box.png",
            "extract_region": true,
            "pieces": [
                { "id": "a", "path": "pieces/a.png" },
                { "id": "b", "path": "pieces/b.png" }
            ],
            "params": { "placement": { "min_inliers": 8 } },
            "output": { "json_out": "out/report.json" }
        }"#;
        let config: LocateToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.puzzle_id, "puzzle");
        assert!(config.extract_region);
        assert_eq!(config.pieces.len(), 2);
        assert_eq!(config.pieces[1].id, "b");
        assert_eq!(config.params.placement.min_inliers, 8);
        assert!(config.output.region_out.is_none());
    }

    #[test]
    fn missing_params_file_fails_to_load() {
        let dir = std::env::temp_dir().join(format!("piece-locator-locate-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("locate.json");
        let config_json = serde_json::json!({
            "puzzle": "box.png",
            "pieces": [{ "id": "a", "path": "a.png" }],
            "params_file": dir.join("absent.json")
        });
        std::fs::write(&config_path, config_json.to_string()).unwrap();

        let err = LocateToolConfig::load(&config_path).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(err.starts_with("Failed to read config"), "{err}");
        assert!(err.contains("absent.json"), "{err}");
    }
}
