//! Brute-force descriptor matching with the nearest/second-nearest ratio test.
//!
//! Puzzle features whose descriptors lie within `repeat_epsilon` of the
//! nearest one form its repeat group. The ratio test compares the nearest
//! distance against the closest feature outside that group, and every
//! member of an accepted group becomes a correspondence. A texture printed
//! twice in the reference therefore yields matches to both copies instead
//! of failing the ratio test or arbitrarily keeping one copy.

use crate::error::{ensure, ConfigurationError};
use crate::features::{descriptor_distance, FeatureSet};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    /// Accept when `nearest < ratio_threshold × second_nearest`.
    pub ratio_threshold: f32,
    /// Reject matches whose nearest distance exceeds this (descriptor units, `[0, 2]`).
    pub max_distance: f32,
    /// Keep only mutual nearest neighbours.
    pub cross_check: bool,
    /// Descriptors closer than this to the nearest neighbour count as
    /// repeats of it rather than as competitors in the ratio test.
    pub repeat_epsilon: f32,
    /// Correspondences emitted per piece feature when its nearest neighbour
    /// repeats; lowest puzzle indices are kept.
    pub max_repeats: usize,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.8,
            max_distance: 2.0,
            cross_check: false,
            repeat_epsilon: 1e-3,
            max_repeats: 4,
        }
    }
}

impl MatcherOptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure(
            self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0,
            "matcher.ratio_threshold",
            self.ratio_threshold as f64,
            "(0, 1]",
        )?;
        ensure(
            self.max_distance > 0.0 && self.max_distance.is_finite(),
            "matcher.max_distance",
            self.max_distance as f64,
            "> 0",
        )?;
        ensure(
            self.repeat_epsilon >= 0.0 && self.repeat_epsilon < self.max_distance,
            "matcher.repeat_epsilon",
            self.repeat_epsilon as f64,
            "[0, max_distance)",
        )?;
        ensure(
            self.max_repeats >= 1,
            "matcher.max_repeats",
            self.max_repeats as f64,
            ">= 1",
        )
    }
}

/// Piece feature `piece_index` matched to puzzle feature `puzzle_index`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correspondence {
    pub piece_index: usize,
    pub puzzle_index: usize,
    pub distance: f32,
}

#[derive(Clone, Debug, Default)]
pub struct FeatureMatcher {
    options: MatcherOptions,
}

/// Nearest neighbour of one query together with its repeats.
#[derive(Clone, Debug)]
struct Neighbours {
    best: f32,
    /// Nearest distance outside the repeat group; infinite when none.
    second: f32,
    /// `(index, distance)` of the nearest feature and its repeats, by index.
    group: Vec<(usize, f32)>,
}

/// Earlier indices win distance ties for the nearest feature.
fn neighbours(query: &[f32], set: &FeatureSet, repeat_epsilon: f32) -> Option<Neighbours> {
    let features = set.features();
    let distances: Vec<f32> = features
        .iter()
        .map(|f| descriptor_distance(query, &f.descriptor))
        .collect();
    let (nearest, best) = distances.iter().copied().enumerate().fold(
        None,
        |acc: Option<(usize, f32)>, (i, d)| match acc {
            Some((_, b)) if b <= d => acc,
            _ => Some((i, d)),
        },
    )?;

    let anchor = &features[nearest].descriptor;
    let mut group = Vec::new();
    let mut second = f32::INFINITY;
    for (i, &d) in distances.iter().enumerate() {
        // a repeat of the nearest is at most `repeat_epsilon` further away
        let repeat = i == nearest
            || (d <= best + repeat_epsilon
                && descriptor_distance(anchor, &features[i].descriptor) <= repeat_epsilon);
        if repeat {
            group.push((i, d));
        } else if d < second {
            second = d;
        }
    }
    Some(Neighbours {
        best,
        second,
        group,
    })
}

impl FeatureMatcher {
    pub fn new(options: MatcherOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Whether `piece_index` is the nearest piece feature (or one of its
    /// repeats) as seen from puzzle feature `puzzle_index`.
    fn is_mutual(
        &self,
        piece_index: usize,
        puzzle_index: usize,
        piece: &FeatureSet,
        puzzle: &FeatureSet,
    ) -> bool {
        let back = &puzzle.features()[puzzle_index].descriptor;
        neighbours(back, piece, self.options.repeat_epsilon)
            .is_some_and(|n| n.group.iter().any(|&(i, _)| i == piece_index))
    }

    /// Correspondences sorted by ascending distance, then piece index, then
    /// puzzle index. Empty when either side has no features.
    pub fn match_sets(
        &self,
        piece: &FeatureSet,
        puzzle: &FeatureSet,
    ) -> Result<Vec<Correspondence>, ConfigurationError> {
        if piece.version() != puzzle.version() {
            return Err(ConfigurationError::IncompatibleDescriptors {
                piece: piece.version(),
                puzzle: puzzle.version(),
            });
        }
        if piece.is_empty() || puzzle.is_empty() {
            return Ok(Vec::new());
        }

        let opts = &self.options;
        let accept = |piece_index: usize| -> Vec<Correspondence> {
            let q = &piece.features()[piece_index].descriptor;
            let Some(n) = neighbours(q, puzzle, opts.repeat_epsilon) else {
                return Vec::new();
            };
            if n.best > opts.max_distance || !(n.best < opts.ratio_threshold * n.second) {
                return Vec::new();
            }
            n.group
                .iter()
                .take(opts.max_repeats)
                .filter(|&&(puzzle_index, _)| {
                    !opts.cross_check || self.is_mutual(piece_index, puzzle_index, piece, puzzle)
                })
                .map(|&(puzzle_index, distance)| Correspondence {
                    piece_index,
                    puzzle_index,
                    distance,
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let mut out: Vec<Correspondence> = (0..piece.len())
            .into_par_iter()
            .flat_map_iter(accept)
            .collect();
        #[cfg(not(feature = "parallel"))]
        let mut out: Vec<Correspondence> = (0..piece.len()).flat_map(accept).collect();

        out.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.piece_index.cmp(&b.piece_index))
                .then(a.puzzle_index.cmp(&b.puzzle_index))
        });
        debug!(
            "FeatureMatcher::match_sets piece={} puzzle={} accepted={}",
            piece.len(),
            puzzle.len(),
            out.len()
        );
        Ok(out)
    }
}
