use crate::error::{ensure, ConfigurationError};
use serde::{Deserialize, Serialize};

/// Options for [`super::HarrisPatchExtractor`].
///
/// Only the descriptor fields (`descriptor_grid`, `sample_step`,
/// `orientation_radius`, `blur_passes`) feed the descriptor version; the
/// detection fields change which points are kept but not how they compare.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureOptions {
    /// Hard cap on features per image; strongest responses win.
    pub max_features: usize,
    /// Harris sensitivity `k` in `det - k·trace²`.
    pub harris_k: f32,
    /// Absolute response floor (luma in `[0, 1]`, Sobel units).
    pub response_threshold: f32,
    /// Half-size of the square non-maximum suppression window.
    pub nms_radius: usize,
    /// Descriptor is a `grid × grid` sample lattice.
    pub descriptor_grid: usize,
    /// Lattice spacing in pixels.
    pub sample_step: f32,
    /// Disc radius for the intensity-centroid orientation.
    pub orientation_radius: usize,
    /// Gaussian passes applied before descriptor sampling.
    pub blur_passes: usize,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            max_features: 1000,
            harris_k: 0.04,
            response_threshold: 1e-4,
            nms_radius: 2,
            descriptor_grid: 8,
            sample_step: 2.0,
            orientation_radius: 7,
            blur_passes: 1,
        }
    }
}

impl FeatureOptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure(
            self.max_features >= 1,
            "features.max_features",
            self.max_features as f64,
            ">= 1",
        )?;
        ensure(
            self.harris_k > 0.0 && self.harris_k < 0.25,
            "features.harris_k",
            self.harris_k as f64,
            "(0, 0.25)",
        )?;
        ensure(
            self.response_threshold.is_finite() && self.response_threshold >= 0.0,
            "features.response_threshold",
            self.response_threshold as f64,
            ">= 0",
        )?;
        ensure(
            (1..=16).contains(&self.nms_radius),
            "features.nms_radius",
            self.nms_radius as f64,
            "[1, 16]",
        )?;
        ensure(
            (2..=16).contains(&self.descriptor_grid),
            "features.descriptor_grid",
            self.descriptor_grid as f64,
            "[2, 16]",
        )?;
        ensure(
            self.sample_step > 0.0 && self.sample_step <= 8.0,
            "features.sample_step",
            self.sample_step as f64,
            "(0, 8]",
        )?;
        ensure(
            (1..=32).contains(&self.orientation_radius),
            "features.orientation_radius",
            self.orientation_radius as f64,
            "[1, 32]",
        )?;
        ensure(
            self.blur_passes <= 4,
            "features.blur_passes",
            self.blur_passes as f64,
            "[0, 4]",
        )
    }

    /// Pixels kept clear at each image border so every descriptor and
    /// orientation sample lands inside the image.
    pub fn border_margin(&self) -> usize {
        let half = 0.5 * self.sample_step * (self.descriptor_grid as f32 - 1.0);
        let rotated = half * std::f32::consts::SQRT_2 + 1.0;
        (rotated.ceil() as usize).max(self.orientation_radius) + 1
    }
}
