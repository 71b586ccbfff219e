use crate::error::{ensure, ConfigurationError};
use crate::geometry::TransformModel;
use serde::{Deserialize, Serialize};

/// Consensus search and scoring parameters for [`super::PlacementEstimator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementOptions {
    pub model: TransformModel,
    /// Upper bound on hypotheses drawn per extracted candidate.
    pub max_iterations: usize,
    /// Success probability used to shorten the search once a good
    /// hypothesis is known.
    pub success_probability: f64,
    /// Reprojection distance (puzzle pixels) within which a correspondence
    /// counts as an inlier.
    pub inlier_tolerance_px: f64,
    /// A hypothesis needs at least this many inliers to become a candidate.
    pub min_inliers: usize,
    pub max_candidates: usize,
    /// Plausible piece→puzzle scale range.
    pub min_scale: f64,
    pub max_scale: f64,
    /// How strongly mean descriptor distance lowers confidence, `[0, 1]`.
    pub distance_weight: f64,
    /// Confidence ceiling; never 1.
    pub max_confidence: f64,
    pub seed: u64,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            model: TransformModel::Similarity,
            max_iterations: 500,
            success_probability: 0.999,
            inlier_tolerance_px: 3.0,
            min_inliers: 6,
            max_candidates: 3,
            min_scale: 0.1,
            max_scale: 10.0,
            distance_weight: 0.5,
            max_confidence: 0.99,
            seed: 0x5eed_1e55_0f_5eed,
        }
    }
}

impl PlacementOptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure(
            self.max_iterations >= 1,
            "placement.max_iterations",
            self.max_iterations as f64,
            ">= 1",
        )?;
        ensure(
            self.success_probability > 0.0 && self.success_probability < 1.0,
            "placement.success_probability",
            self.success_probability,
            "(0, 1)",
        )?;
        ensure(
            self.inlier_tolerance_px > 0.0 && self.inlier_tolerance_px.is_finite(),
            "placement.inlier_tolerance_px",
            self.inlier_tolerance_px,
            "> 0",
        )?;
        ensure(
            self.min_inliers >= self.model.min_samples(),
            "placement.min_inliers",
            self.min_inliers as f64,
            ">= minimal sample size of the model",
        )?;
        ensure(
            self.max_candidates >= 1,
            "placement.max_candidates",
            self.max_candidates as f64,
            ">= 1",
        )?;
        ensure(
            self.min_scale > 0.0,
            "placement.min_scale",
            self.min_scale,
            "> 0",
        )?;
        ensure(
            self.max_scale >= self.min_scale && self.max_scale.is_finite(),
            "placement.max_scale",
            self.max_scale,
            ">= min_scale",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.distance_weight),
            "placement.distance_weight",
            self.distance_weight,
            "[0, 1]",
        )?;
        ensure(
            self.max_confidence > 0.0 && self.max_confidence < 1.0,
            "placement.max_confidence",
            self.max_confidence,
            "(0, 1)",
        )
    }
}
