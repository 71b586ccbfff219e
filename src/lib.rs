#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod error;
pub mod geometry;
pub mod image;
pub mod index;
pub mod locator;
pub mod types;

// Stage modules, usable on their own.
pub mod detect;
pub mod diagnostics;
pub mod features;
pub mod matching;
pub mod placement;
pub mod pyramid;
pub mod rectify;

mod fingerprint;

// --- High-level re-exports -------------------------------------------------

// Main entry point and its configuration.
pub use crate::locator::{LocateReport, LocatorParams, PieceLocator, RegionFallback};

// Results, identifiers and errors.
pub use crate::error::{ConfigurationError, ExtractionError, GeometryError, LocatorError};
pub use crate::types::{AnalysisResult, MatchCandidate, PieceId, PuzzleId};

// Seams for alternative detection and extraction primitives.
pub use crate::detect::QuadDetector;
pub use crate::features::FeatureExtractor;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use piece_locator::prelude::*;
///
/// # fn main() -> Result<(), LocatorError> {
/// let (w, h) = (400usize, 300usize);
/// let photo = RasterImage::gray(w, h, vec![0u8; w * h])?;
///
/// let locator = PieceLocator::new(LocatorParams::default())?;
/// let region = locator.extract_reference_region(&photo)?;
/// locator.build_feature_index(region, "box")?;
///
/// let piece = photo.crop(10, 10, 64, 64);
/// let candidates = locator.locate_piece(&PieceId::new("p1"), &piece, &PuzzleId::new("box"))?;
/// println!("candidates={}", candidates.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{PixelFormat, RasterImage};
    pub use crate::{
        LocatorError, LocatorParams, MatchCandidate, PieceId, PieceLocator, PuzzleId,
    };
}
