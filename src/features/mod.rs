//! Keypoints with fixed-length descriptors.
//!
//! [`FeatureExtractor`] is the seam for alternative keypoint backends. The
//! bundled [`HarrisPatchExtractor`] pipeline:
//!
//! 1. Rec.601 luma, Sobel gradients, Gaussian-smoothed structure tensor.
//! 2. Harris response, square-window non-maximum suppression, border margin
//!    wide enough for the rotated descriptor window.
//! 3. Strongest `max_features` by response, ties by `(y, x)`.
//! 4. Per keypoint: intensity-centroid orientation, rotated lattice sample of
//!    the blurred luma, mean-subtracted and L2-normalised.
//!
//! Descriptors from extractors with different [`DescriptorVersion`]s are not
//! comparable; the matcher refuses to mix them.

pub mod descriptor;
pub mod gradient;
pub mod options;
pub(crate) mod response;

pub use descriptor::descriptor_distance;
pub use options::FeatureOptions;

use crate::error::{ConfigurationError, ExtractionError};
use crate::fingerprint::Fingerprint;
use crate::geometry::Point2D;
use crate::image::{LumaImage, RasterImage};
use crate::pyramid::filters::{apply as apply_filter, GAUSSIAN_5TAP};
use log::debug;
use response::{harris_response, select_keypoints, Keypoint};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Tag identifying the extractor configuration that produced a descriptor.
pub type DescriptorVersion = u32;

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// Pixel-centre location in image coordinates.
    pub location: Point2D,
    pub response: f32,
    /// Radians, `(-π, π]`.
    pub angle: f32,
    pub descriptor: Vec<f32>,
}

/// Features of one image plus the dimensions they were measured in.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSet {
    width: usize,
    height: usize,
    version: DescriptorVersion,
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(
        width: usize,
        height: usize,
        version: DescriptorVersion,
        features: Vec<Feature>,
    ) -> Self {
        Self {
            width,
            height,
            version,
            features,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn version(&self) -> DescriptorVersion {
        self.version
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }
}

pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, image: &RasterImage) -> Result<FeatureSet, ExtractionError>;

    /// Version stamped into every set this extractor produces.
    fn version(&self) -> DescriptorVersion;
}

#[derive(Clone, Debug)]
pub struct HarrisPatchExtractor {
    options: FeatureOptions,
    version: DescriptorVersion,
}

impl Default for HarrisPatchExtractor {
    fn default() -> Self {
        let options = FeatureOptions::default();
        let version = descriptor_version(&options);
        Self { options, version }
    }
}

impl HarrisPatchExtractor {
    pub fn new(options: FeatureOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        let version = descriptor_version(&options);
        Ok(Self { options, version })
    }

    pub fn options(&self) -> &FeatureOptions {
        &self.options
    }

    fn keypoints(&self, luma: &LumaImage) -> Vec<Keypoint> {
        let response = harris_response(luma, self.options.harris_k);
        select_keypoints(
            &response,
            self.options.response_threshold,
            self.options.nms_radius,
            self.options.border_margin(),
            self.options.max_features,
        )
    }

    fn describe_keypoint(&self, smooth: &LumaImage, kp: &Keypoint) -> Option<Feature> {
        let opts = &self.options;
        let angle = descriptor::orientation(smooth, kp.x, kp.y, opts.orientation_radius);
        let descriptor = descriptor::describe(
            smooth,
            kp.x as f32,
            kp.y as f32,
            angle,
            opts.descriptor_grid,
            opts.sample_step,
        )?;
        Some(Feature {
            location: Point2D::new(kp.x as f64 + 0.5, kp.y as f64 + 0.5),
            response: kp.response,
            angle,
            descriptor,
        })
    }
}

impl FeatureExtractor for HarrisPatchExtractor {
    fn extract(&self, image: &RasterImage) -> Result<FeatureSet, ExtractionError> {
        image.ensure_non_empty()?;
        let start = Instant::now();
        let luma = image.to_luma();
        let keypoints = self.keypoints(&luma);

        let mut smooth = luma;
        for _ in 0..self.options.blur_passes {
            smooth = apply_filter(&GAUSSIAN_5TAP, &smooth);
        }

        #[cfg(feature = "parallel")]
        let features: Vec<Feature> = keypoints
            .par_iter()
            .filter_map(|kp| self.describe_keypoint(&smooth, kp))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let features: Vec<Feature> = keypoints
            .iter()
            .filter_map(|kp| self.describe_keypoint(&smooth, kp))
            .collect();

        debug!(
            "HarrisPatchExtractor::extract {}x{} keypoints={} features={} elapsed_ms={:.3}",
            image.width(),
            image.height(),
            keypoints.len(),
            features.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(FeatureSet::new(
            image.width(),
            image.height(),
            self.version,
            features,
        ))
    }

    fn version(&self) -> DescriptorVersion {
        self.version
    }
}

fn descriptor_version(opts: &FeatureOptions) -> DescriptorVersion {
    let h = Fingerprint::new()
        .str("harris-patch/1")
        .usize(opts.descriptor_grid)
        .u64(opts.sample_step.to_bits() as u64)
        .usize(opts.orientation_radius)
        .usize(opts.blur_passes)
        .finish();
    (h ^ (h >> 32)) as u32
}
