use crate::diagnostics::TimingBreakdown;
use crate::types::{MatchCandidate, PieceId, PuzzleId};
use serde::{Deserialize, Serialize};

/// Detailed result of locating one piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateReport {
    pub piece_id: PieceId,
    pub puzzle_id: PuzzleId,
    /// Ranked best first; empty when the piece could not be placed.
    pub candidates: Vec<MatchCandidate>,
    pub piece_features: usize,
    pub puzzle_features: usize,
    /// Correspondences surviving the ratio test.
    pub correspondences: usize,
    pub timing: TimingBreakdown,
}
