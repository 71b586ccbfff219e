use crate::geometry::NormalizedRect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Caller-chosen identifier of a reference (puzzle box) image.
    PuzzleId
);
string_id!(
    /// Caller-chosen identifier of a piece photo.
    PieceId
);

/// One hypothesis for where a piece sits inside the reference region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub piece_id: PieceId,
    /// Location relative to the rectified reference region.
    pub rect: NormalizedRect,
    /// In `[0, 1]`; higher is better.
    pub confidence: f64,
    pub inlier_count: usize,
    /// Piece pixel → reference pixel, row-major homogeneous matrix.
    pub transform: [[f64; 3]; 3],
}

/// Ordering used for every candidate list: confidence desc, inliers desc,
/// then rectangle origin (y, x) asc.
pub(crate) fn rank_candidates(a: &MatchCandidate, b: &MatchCandidate) -> std::cmp::Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.inlier_count.cmp(&a.inlier_count))
        .then_with(|| a.rect.y.total_cmp(&b.rect.y))
        .then_with(|| a.rect.x.total_cmp(&b.rect.x))
}

/// Outcome of matching a batch of pieces against one reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub puzzle_id: PuzzleId,
    /// Pieces in the order they were submitted.
    pub piece_ids: Vec<PieceId>,
    pub matches: BTreeMap<PieceId, Vec<MatchCandidate>>,
    pub created_at: SystemTime,
}

impl AnalysisResult {
    /// Best candidate for a piece, if any.
    pub fn best_match(&self, piece: &PieceId) -> Option<&MatchCandidate> {
        self.matches.get(piece).and_then(|c| c.first())
    }

    /// Number of pieces that received at least one candidate.
    pub fn located_count(&self) -> usize {
        self.matches.values().filter(|c| !c.is_empty()).count()
    }
}
