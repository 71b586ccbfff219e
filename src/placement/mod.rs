//! Placement estimation: turns correspondences into ranked candidate
//! rectangles inside the reference image.
//!
//! Hypotheses are extracted greedily. After each accepted hypothesis its
//! inliers leave the pool. When the piece's texture repeats in the puzzle
//! the matcher emits correspondences to every copy, so each copy can
//! become its own candidate. The random generator is seeded from
//! [`PlacementOptions::seed`] mixed with a hash of the inputs, so identical
//! calls return identical candidates.

pub mod options;
pub(crate) mod ransac;

pub use options::PlacementOptions;

use crate::error::ConfigurationError;
use crate::features::FeatureSet;
use crate::fingerprint::Fingerprint;
use crate::geometry::{NormalizedRect, Point2D, Transform2D};
use crate::matching::Correspondence;
use crate::types::{rank_candidates, MatchCandidate, PieceId};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ransac::{search, PointPair};

#[derive(Clone, Debug, Default)]
pub struct PlacementEstimator {
    options: PlacementOptions,
}

/// `inlier_ratio × (1 − distance_weight × mean_distance / 2)`, clamped to
/// `[0, max_confidence]`. Non-decreasing in the inlier count and
/// non-increasing in the mean descriptor distance.
pub fn confidence_score(
    inlier_count: usize,
    total: usize,
    mean_distance: f64,
    options: &PlacementOptions,
) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = inlier_count.min(total) as f64 / total as f64;
    let quality = 1.0 - options.distance_weight * (mean_distance.clamp(0.0, 2.0) / 2.0);
    (ratio * quality).clamp(0.0, options.max_confidence)
}

fn input_seed(base: u64, piece: &FeatureSet, puzzle: &FeatureSet, corrs: &[Correspondence]) -> u64 {
    let mut fp = Fingerprint::new();
    fp.u64(base)
        .usize(piece.width())
        .usize(piece.height())
        .usize(puzzle.width())
        .usize(puzzle.height());
    for c in corrs {
        fp.usize(c.piece_index)
            .usize(c.puzzle_index)
            .u64(c.distance.to_bits() as u64);
    }
    fp.finish()
}

impl PlacementEstimator {
    pub fn new(options: PlacementOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PlacementOptions {
        &self.options
    }

    /// The piece's full frame mapped through `t`, as a rectangle of the puzzle.
    fn placement_rect(
        &self,
        t: &Transform2D,
        piece: &FeatureSet,
        puzzle: &FeatureSet,
    ) -> Option<NormalizedRect> {
        let (w, h) = (piece.width() as f64, piece.height() as f64);
        let corners = [
            Point2D::new(0.0, 0.0),
            Point2D::new(w, 0.0),
            Point2D::new(0.0, h),
            Point2D::new(w, h),
        ]
        .map(|p| t.map_point(p));
        let x0 = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let x1 = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let y0 = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y1 = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        NormalizedRect::from_pixel_rect(x0, y0, x1, y1, puzzle.width(), puzzle.height())
    }

    /// Ranked candidates for one piece. Empty when the correspondences
    /// cannot support any hypothesis.
    pub fn estimate(
        &self,
        piece: &FeatureSet,
        puzzle: &FeatureSet,
        correspondences: &[Correspondence],
        piece_id: &PieceId,
    ) -> Vec<MatchCandidate> {
        let opts = &self.options;
        let total = correspondences.len();
        let mut candidates = Vec::new();
        if total < opts.model.min_samples() {
            debug!(
                "PlacementEstimator::estimate piece={} correspondences={} below minimal sample",
                piece_id, total
            );
            return candidates;
        }

        let mut pairs = Vec::with_capacity(total);
        let mut distances = Vec::with_capacity(total);
        for c in correspondences {
            let (Some(src), Some(dst)) = (piece.get(c.piece_index), puzzle.get(c.puzzle_index))
            else {
                continue;
            };
            pairs.push(PointPair {
                src: src.location,
                dst: dst.location,
            });
            distances.push(c.distance as f64);
        }
        if pairs.len() != total {
            debug!(
                "PlacementEstimator::estimate dropped {} correspondences with stale indices",
                total - pairs.len()
            );
        }

        let mut rng = StdRng::seed_from_u64(input_seed(opts.seed, piece, puzzle, correspondences));
        let mut active: Vec<usize> = (0..pairs.len()).collect();
        for round in 0..opts.max_candidates {
            if active.len() < opts.min_inliers {
                break;
            }
            let Some(hyp) = search(&mut rng, &pairs, &active, opts) else {
                break;
            };
            if hyp.inliers.len() < opts.min_inliers {
                debug!(
                    "PlacementEstimator::estimate round={} best_inliers={} < min_inliers={}",
                    round,
                    hyp.inliers.len(),
                    opts.min_inliers
                );
                break;
            }
            let mean_distance = hyp
                .inliers
                .iter()
                .map(|&i| distances[i])
                .sum::<f64>()
                / hyp.inliers.len() as f64;
            let confidence = confidence_score(hyp.inliers.len(), total, mean_distance, opts);
            match self.placement_rect(&hyp.transform, piece, puzzle) {
                Some(rect) => candidates.push(MatchCandidate {
                    piece_id: piece_id.clone(),
                    rect,
                    confidence,
                    inlier_count: hyp.inliers.len(),
                    transform: hyp.transform.to_matrix3(),
                }),
                None => debug!(
                    "PlacementEstimator::estimate round={} placement falls outside the puzzle",
                    round
                ),
            }
            active.retain(|i| hyp.inliers.binary_search(i).is_err());
        }

        candidates.sort_by(rank_candidates);
        debug!(
            "PlacementEstimator::estimate piece={} correspondences={} candidates={}",
            piece_id,
            total,
            candidates.len()
        );
        candidates
    }
}
