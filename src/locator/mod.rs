//! Entry points tying the stages together.
//!
//! Overview
//! - [`PieceLocator::extract_reference_region`] finds the dominant rectangle
//!   in a photo and unwarps it, falling back to [`RegionFallback`] when no
//!   rectangle qualifies.
//! - [`PieceLocator::build_feature_index`] registers a reference image under a
//!   puzzle id. Features are built lazily on the first locate call.
//! - [`PieceLocator::locate_piece`] extracts piece features, matches them
//!   against the indexed reference and runs the consensus placement.
//!
//! The locator is `Sync`: one instance can serve concurrent locate calls, and
//! the index tolerates concurrent re-indexing of other ids.

pub mod params;
pub mod report;

pub use params::{LocatorParams, RegionFallback};
pub use report::LocateReport;

use crate::detect::{ContourQuadDetector, QuadDetector};
use crate::diagnostics::{elapsed_ms, TimingBreakdown};
use crate::error::{LocatorError, Result};
use crate::features::{FeatureExtractor, HarrisPatchExtractor};
use crate::geometry::Quadrilateral;
use crate::image::RasterImage;
use crate::index::{FeatureIndex, InsertOutcome};
use crate::matching::FeatureMatcher;
use crate::placement::PlacementEstimator;
use crate::rectify::rectify;
use crate::types::{AnalysisResult, MatchCandidate, PieceId, PuzzleId};
use log::debug;
use std::collections::BTreeMap;
use std::time::{Instant, SystemTime};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub struct PieceLocator {
    params: LocatorParams,
    detector: Box<dyn QuadDetector>,
    extractor: Box<dyn FeatureExtractor>,
    matcher: FeatureMatcher,
    estimator: PlacementEstimator,
    index: FeatureIndex,
}

impl PieceLocator {
    /// Locator with the bundled contour detector and Harris extractor.
    pub fn new(params: LocatorParams) -> Result<Self> {
        let detector = ContourQuadDetector::new(params.detector.clone())?;
        let extractor = HarrisPatchExtractor::new(params.features.clone())?;
        Self::with_components(params, Box::new(detector), Box::new(extractor))
    }

    /// Locator backed by caller-supplied detection and extraction primitives.
    /// `params.detector` and `params.features` are still validated but only
    /// the built-in components read them.
    pub fn with_components(
        params: LocatorParams,
        detector: Box<dyn QuadDetector>,
        extractor: Box<dyn FeatureExtractor>,
    ) -> Result<Self> {
        params.validate()?;
        let matcher = FeatureMatcher::new(params.matcher.clone())?;
        let estimator = PlacementEstimator::new(params.placement.clone())?;
        Ok(Self {
            params,
            detector,
            extractor,
            matcher,
            estimator,
            index: FeatureIndex::new(),
        })
    }

    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    /// Run only the rectangle detector.
    pub fn detect_quad(&self, image: &RasterImage) -> Option<Quadrilateral> {
        self.detector.detect(image)
    }

    /// Upright raster of the dominant rectangle, or the fallback region.
    pub fn extract_reference_region(&self, image: &RasterImage) -> Result<RasterImage> {
        image.ensure_non_empty()?;
        if let Some(quad) = self.detector.detect(image) {
            match rectify(image, &quad, &self.params.rectify) {
                Ok(region) => {
                    debug!(
                        "PieceLocator::extract_reference_region quad area={:.1} -> {}x{}",
                        quad.area(),
                        region.width(),
                        region.height()
                    );
                    return Ok(region);
                }
                Err(LocatorError::Geometry(err)) => {
                    debug!("PieceLocator::extract_reference_region rectify failed: {err}");
                }
                Err(err) => return Err(err),
            }
        }
        debug!(
            "PieceLocator::extract_reference_region fallback={:?}",
            self.params.fallback
        );
        Ok(match self.params.fallback {
            RegionFallback::CenterSquare => image.center_square_crop(),
            RegionFallback::WholeImage => image.clone(),
        })
    }

    /// Register (or replace) the reference image for `puzzle_id`. The image
    /// is indexed as given; rectify it first if it is a raw photo.
    pub fn build_feature_index(
        &self,
        puzzle_image: RasterImage,
        puzzle_id: impl Into<PuzzleId>,
    ) -> Result<InsertOutcome> {
        puzzle_image.ensure_non_empty()?;
        let id = puzzle_id.into();
        let outcome = self.index.insert(id, puzzle_image);
        Ok(outcome)
    }

    /// Drop the cached entry for `puzzle_id`; returns whether one existed.
    pub fn invalidate(&self, puzzle_id: &PuzzleId) -> bool {
        self.index.invalidate(puzzle_id)
    }

    /// Ranked placement candidates of one piece inside the indexed reference.
    pub fn locate_piece(
        &self,
        piece_id: &PieceId,
        piece_image: &RasterImage,
        puzzle_id: &PuzzleId,
    ) -> Result<Vec<MatchCandidate>> {
        self.locate_piece_detailed(piece_id, piece_image, puzzle_id)
            .map(|report| report.candidates)
    }

    /// [`Self::locate_piece`] plus feature counts and stage timings.
    pub fn locate_piece_detailed(
        &self,
        piece_id: &PieceId,
        piece_image: &RasterImage,
        puzzle_id: &PuzzleId,
    ) -> Result<LocateReport> {
        let start = Instant::now();
        let entry = self
            .index
            .get(puzzle_id)
            .ok_or_else(|| LocatorError::NotIndexed {
                puzzle_id: puzzle_id.to_string(),
            })?;
        let mut timing = TimingBreakdown::default();

        let stage = Instant::now();
        let puzzle = entry.features(self.extractor.as_ref())?;
        timing.push("puzzle_features", elapsed_ms(stage));

        let stage = Instant::now();
        let piece = self.extractor.extract(piece_image)?;
        timing.push("piece_features", elapsed_ms(stage));

        let stage = Instant::now();
        let correspondences = self.matcher.match_sets(&piece, &puzzle)?;
        timing.push("matching", elapsed_ms(stage));

        let stage = Instant::now();
        let candidates = self
            .estimator
            .estimate(&piece, &puzzle, &correspondences, piece_id);
        timing.push("placement", elapsed_ms(stage));
        timing.total_ms = elapsed_ms(start);

        debug!(
            "PieceLocator::locate_piece piece={} puzzle={} features={}/{} correspondences={} candidates={} total_ms={:.3}",
            piece_id,
            puzzle_id,
            piece.len(),
            puzzle.len(),
            correspondences.len(),
            candidates.len(),
            timing.total_ms
        );

        Ok(LocateReport {
            piece_id: piece_id.clone(),
            puzzle_id: puzzle_id.clone(),
            candidates,
            piece_features: piece.len(),
            puzzle_features: puzzle.len(),
            correspondences: correspondences.len(),
            timing,
        })
    }

    /// Locate every piece against one reference. Pieces run in parallel;
    /// the first failing piece in submission order determines the error.
    /// A repeated piece id keeps the candidates of its last occurrence.
    pub fn analyze(
        &self,
        puzzle_id: &PuzzleId,
        pieces: &[(PieceId, RasterImage)],
    ) -> Result<AnalysisResult> {
        if !self.index.contains(puzzle_id) {
            return Err(LocatorError::NotIndexed {
                puzzle_id: puzzle_id.to_string(),
            });
        }
        let run = |(id, image): &(PieceId, RasterImage)| self.locate_piece(id, image, puzzle_id);

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Result<Vec<MatchCandidate>>> = pieces.par_iter().map(run).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Result<Vec<MatchCandidate>>> = pieces.iter().map(run).collect();

        let mut matches = BTreeMap::new();
        for ((id, _), outcome) in pieces.iter().zip(outcomes) {
            matches.insert(id.clone(), outcome?);
        }
        let result = AnalysisResult {
            puzzle_id: puzzle_id.clone(),
            piece_ids: pieces.iter().map(|(id, _)| id.clone()).collect(),
            matches,
            created_at: SystemTime::now(),
        };
        debug!(
            "PieceLocator::analyze puzzle={} pieces={} located={}",
            puzzle_id,
            result.piece_ids.len(),
            result.located_count()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, ExtractionError};
    use crate::image::PixelFormat;

    struct NoQuad;

    impl QuadDetector for NoQuad {
        fn detect(&self, _image: &RasterImage) -> Option<Quadrilateral> {
            None
        }
    }

    fn locator_without_detection(fallback: RegionFallback) -> PieceLocator {
        let params = LocatorParams {
            fallback,
            ..LocatorParams::default()
        };
        PieceLocator::with_components(
            params,
            Box::new(NoQuad),
            Box::new(HarrisPatchExtractor::default()),
        )
        .unwrap()
    }

    fn plain(w: usize, h: usize) -> RasterImage {
        RasterImage::new(w, h, PixelFormat::Rgb8, vec![120; w * h * 3]).unwrap()
    }

    #[test]
    fn invalid_params_are_rejected_on_construction() {
        let mut params = LocatorParams::default();
        params.placement.inlier_tolerance_px = -1.0;
        let err = PieceLocator::new(params).err().unwrap();
        assert!(matches!(
            err,
            LocatorError::Configuration(ConfigurationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn fallback_crops_center_square() {
        let locator = locator_without_detection(RegionFallback::CenterSquare);
        let region = locator.extract_reference_region(&plain(80, 50)).unwrap();
        assert_eq!((region.width(), region.height()), (50, 50));
    }

    #[test]
    fn fallback_can_keep_whole_image() {
        let locator = locator_without_detection(RegionFallback::WholeImage);
        let image = plain(80, 50);
        assert_eq!(locator.extract_reference_region(&image).unwrap(), image);
    }

    #[test]
    fn empty_input_is_an_extraction_error() {
        let locator = locator_without_detection(RegionFallback::CenterSquare);
        let empty = RasterImage::gray(0, 10, Vec::new()).unwrap();
        assert!(matches!(
            locator.extract_reference_region(&empty),
            Err(LocatorError::Extraction(ExtractionError::EmptyImage { .. }))
        ));
        assert!(locator.build_feature_index(empty, "p").is_err());
    }

    #[test]
    fn unindexed_puzzle_fails() {
        let locator = locator_without_detection(RegionFallback::CenterSquare);
        let err = locator
            .locate_piece(&PieceId::new("a"), &plain(20, 20), &PuzzleId::new("missing"))
            .unwrap_err();
        assert_eq!(
            err,
            LocatorError::NotIndexed {
                puzzle_id: "missing".to_string()
            }
        );
    }

    #[test]
    fn featureless_piece_yields_no_candidates() {
        let locator = locator_without_detection(RegionFallback::CenterSquare);
        let id = PuzzleId::new("flat");
        assert_eq!(
            locator.build_feature_index(plain(64, 64), id.clone()).unwrap(),
            InsertOutcome::Added
        );
        let report = locator
            .locate_piece_detailed(&PieceId::new("a"), &plain(32, 32), &id)
            .unwrap();
        assert!(report.candidates.is_empty());
        assert_eq!(report.piece_features, 0);
        assert!(report.timing.stage("matching").is_some());
        assert!(locator.invalidate(&id));
        assert!(!locator.invalidate(&id));
    }
}
