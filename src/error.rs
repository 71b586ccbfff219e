//! Error taxonomy for the localization engine.
//!
//! Every error is recoverable by the caller. "No quadrilateral found" and
//! "no candidates found" are not errors: they surface as `None` / empty
//! vectors from the respective operations.

use thiserror::Error;

/// Result alias for the top-level engine operations.
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Invalid or degenerate geometric input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Near-zero area, non-convex corner ordering, collinear corners or an
    /// output size of zero on either axis.
    #[error("degenerate quadrilateral")]
    DegenerateQuad,

    /// A linear system built from point correspondences had no unique solution.
    #[error("point configuration does not determine a unique transform")]
    SingularTransform,
}

/// Invalid image input handed to an extraction stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Width or height is zero.
    #[error("image has zero dimension ({width}x{height})")]
    EmptyImage { width: usize, height: usize },

    /// Pixel buffer length does not match `width * height * channels`.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Out-of-range parameters or incompatible configurations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("parameter `{parameter}` = {value} is out of range ({expected})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Descriptors produced by differently configured extractors are not comparable.
    #[error("descriptor versions differ (piece {piece:#010x}, puzzle {puzzle:#010x})")]
    IncompatibleDescriptors { piece: u32, puzzle: u32 },
}

impl ConfigurationError {
    pub(crate) fn out_of_range(parameter: &'static str, value: f64, expected: &'static str) -> Self {
        Self::OutOfRange {
            parameter,
            value,
            expected,
        }
    }
}

/// Umbrella error returned by [`crate::PieceLocator`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocatorError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Matching was attempted before `build_feature_index` ran for this id.
    #[error("puzzle `{puzzle_id}` has not been indexed")]
    NotIndexed { puzzle_id: String },
}

/// Check helper shared by the option `validate()` implementations.
pub(crate) fn ensure(
    ok: bool,
    parameter: &'static str,
    value: f64,
    expected: &'static str,
) -> std::result::Result<(), ConfigurationError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigurationError::out_of_range(parameter, value, expected))
    }
}
