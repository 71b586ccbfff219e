use crate::error::{ensure, ConfigurationError};
use serde::{Deserialize, Serialize};

/// Acceptance rules for [`super::ContourQuadDetector`].
///
/// Defaults follow the usual document/box-capture settings: aspect ratio in
/// `[0.5, 2.0]`, object covering at least 20% of the frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadDetectorOptions {
    /// Lower bound on mean horizontal edge / mean vertical edge.
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Minimum quad area as a fraction of the image area.
    pub min_relative_size: f64,
    /// Minimum quad area / hull area; rejects round or ragged blobs.
    pub min_fill_ratio: f64,
    /// Interior corner angles must lie in `[min, 180 - min]` degrees.
    pub min_corner_angle_deg: f64,
    /// Detection runs on a pyramid level whose longer side is at most this.
    pub working_max_side: usize,
    /// Hull is simplified to this many vertices before the quad search.
    pub max_hull_vertices: usize,
}

impl Default for QuadDetectorOptions {
    fn default() -> Self {
        Self {
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 2.0,
            min_relative_size: 0.2,
            min_fill_ratio: 0.85,
            min_corner_angle_deg: 30.0,
            working_max_side: 512,
            max_hull_vertices: 64,
        }
    }
}

impl QuadDetectorOptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure(
            self.min_aspect_ratio > 0.0 && self.min_aspect_ratio.is_finite(),
            "detector.min_aspect_ratio",
            self.min_aspect_ratio,
            "> 0",
        )?;
        ensure(
            self.max_aspect_ratio >= self.min_aspect_ratio && self.max_aspect_ratio.is_finite(),
            "detector.max_aspect_ratio",
            self.max_aspect_ratio,
            ">= min_aspect_ratio",
        )?;
        ensure(
            self.min_relative_size > 0.0 && self.min_relative_size <= 1.0,
            "detector.min_relative_size",
            self.min_relative_size,
            "(0, 1]",
        )?;
        ensure(
            self.min_fill_ratio > 0.0 && self.min_fill_ratio <= 1.0,
            "detector.min_fill_ratio",
            self.min_fill_ratio,
            "(0, 1]",
        )?;
        ensure(
            (0.0..90.0).contains(&self.min_corner_angle_deg),
            "detector.min_corner_angle_deg",
            self.min_corner_angle_deg,
            "[0, 90)",
        )?;
        ensure(
            self.working_max_side >= 32,
            "detector.working_max_side",
            self.working_max_side as f64,
            ">= 32",
        )?;
        ensure(
            self.max_hull_vertices >= 4,
            "detector.max_hull_vertices",
            self.max_hull_vertices as f64,
            ">= 4",
        )
    }
}
