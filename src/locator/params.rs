//! Parameter types configuring the locator stages.
//!
//! [`LocatorParams`] groups the options of every stage plus the region
//! fallback policy. All of it deserialises from JSON with missing fields
//! taking their defaults, so a config file only lists what it overrides.

use crate::detect::QuadDetectorOptions;
use crate::error::ConfigurationError;
use crate::features::FeatureOptions;
use crate::matching::MatcherOptions;
use crate::placement::PlacementOptions;
use crate::rectify::RectifyOptions;
use crate::config::load_config;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `extract_reference_region` returns when no quadrilateral is found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionFallback {
    /// Largest square centred in the frame.
    #[default]
    CenterSquare,
    /// The input image unchanged.
    WholeImage,
}

/// Locator-wide parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// Rectangle acceptance rules for reference region detection.
    pub detector: QuadDetectorOptions,
    /// Output sizing of the rectified region.
    pub rectify: RectifyOptions,
    /// Keypoint and descriptor settings shared by pieces and references.
    pub features: FeatureOptions,
    /// Ratio test and cross-check.
    pub matcher: MatcherOptions,
    /// RANSAC model, tolerances and confidence shaping.
    pub placement: PlacementOptions,
    pub fallback: RegionFallback,
}

impl LocatorParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.detector.validate()?;
        self.rectify.validate()?;
        self.features.validate()?;
        self.matcher.validate()?;
        self.placement.validate()
    }

    /// Read and validate parameters from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, String> {
        let params: LocatorParams = load_config(path)?;
        params
            .validate()
            .map_err(|e| format!("Invalid params {}: {e}", path.display()))?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TransformModel;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "matcher": { "ratio_threshold": 0.7 },
            "placement": { "model": "affine" },
            "fallback": "whole_image"
        }"#;
        let params: LocatorParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.matcher.ratio_threshold, 0.7);
        assert_eq!(params.placement.model, TransformModel::Affine);
        assert_eq!(params.fallback, RegionFallback::WholeImage);
        assert_eq!(params.detector, QuadDetectorOptions::default());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validation_reports_first_bad_stage() {
        let mut params = LocatorParams::default();
        params.matcher.ratio_threshold = 1.5;
        match params.validate() {
            Err(ConfigurationError::OutOfRange { parameter, .. }) => {
                assert!(parameter.starts_with("matcher."))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let err = LocatorParams::from_json_file(Path::new("/nonexistent/params.json")).unwrap_err();
        assert!(err.starts_with("Failed to read config"), "{err}");
    }

    #[test]
    fn out_of_range_file_is_reported() {
        let path = std::env::temp_dir()
            .join(format!("piece-locator-params-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "matcher": { "ratio_threshold": 3.0 } }"#).unwrap();
        let err = LocatorParams::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.starts_with("Invalid params"), "{err}");
        assert!(err.contains("matcher.ratio_threshold"), "{err}");
    }
}
