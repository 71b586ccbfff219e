//! Point, quadrilateral and rectangle primitives shared by every stage.
//!
//! Coordinates are pixels with the origin at the top-left corner, x to the
//! right and y down. [`Quadrilateral`] corner order (TL, TR, BL, BR) is an
//! invariant all downstream code relies on.

pub mod transform;

pub use transform::{
    estimate_affine, estimate_similarity, estimate_transform, Homography, Transform2D,
    TransformModel,
};

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

/// Minimum area (px²) for a quadrilateral to be considered non-degenerate.
pub const MIN_QUAD_AREA: f64 = 1.0;

/// Relative tolerance on corner turn magnitude before three corners count as collinear.
const COLLINEAR_EPS: f64 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point2D, b: Point2D) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// z-component of `(b - a) × (c - b)`.
#[inline]
pub(crate) fn turn(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x)
}

/// Shoelace area of a closed polygon; positive when clockwise on screen (y down).
pub(crate) fn signed_area(poly: &[Point2D]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let p = poly[i];
        let q = poly[(i + 1) % n];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

/// Four corners of a rectangular object seen under perspective.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_left: Point2D,
    pub bottom_right: Point2D,
}

impl Quadrilateral {
    pub fn new(
        top_left: Point2D,
        top_right: Point2D,
        bottom_left: Point2D,
        bottom_right: Point2D,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Axis-aligned rectangle `[x0, x1] × [y0, y1]`.
    pub fn from_rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(
            Point2D::new(x0, y0),
            Point2D::new(x1, y0),
            Point2D::new(x0, y1),
            Point2D::new(x1, y1),
        )
    }

    /// Inverse of [`Quadrilateral::corners`].
    pub fn from_corners(c: [Point2D; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Corners in the canonical TL, TR, BL, BR order.
    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Corners walked around the boundary: TL, TR, BR, BL.
    pub fn corners_clockwise(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn top_length(&self) -> f64 {
        distance(self.top_left, self.top_right)
    }

    pub fn bottom_length(&self) -> f64 {
        distance(self.bottom_left, self.bottom_right)
    }

    pub fn left_length(&self) -> f64 {
        distance(self.top_left, self.bottom_left)
    }

    pub fn right_length(&self) -> f64 {
        distance(self.top_right, self.bottom_right)
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.corners_clockwise()).abs()
    }

    pub fn centroid(&self) -> Point2D {
        let c = self.corners();
        Point2D::new(
            c.iter().map(|p| p.x).sum::<f64>() / 4.0,
            c.iter().map(|p| p.y).sum::<f64>() / 4.0,
        )
    }

    /// Mean horizontal edge length over mean vertical edge length.
    pub fn aspect_ratio(&self) -> f64 {
        let horizontal = 0.5 * (self.top_length() + self.bottom_length());
        let vertical = 0.5 * (self.left_length() + self.right_length());
        if vertical <= f64::EPSILON {
            f64::INFINITY
        } else {
            horizontal / vertical
        }
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(
            self.top_left.scaled(sx, sy),
            self.top_right.scaled(sx, sy),
            self.bottom_left.scaled(sx, sy),
            self.bottom_right.scaled(sx, sy),
        )
    }

    /// Strictly convex with consistent winding and no three collinear corners.
    pub fn is_convex(&self) -> bool {
        let b = self.corners_clockwise();
        let mut sign = 0.0f64;
        for i in 0..4 {
            let p0 = b[i];
            let p1 = b[(i + 1) % 4];
            let p2 = b[(i + 2) % 4];
            let t = turn(p0, p1, p2);
            let scale = distance(p0, p1) * distance(p1, p2);
            if !t.is_finite() || t.abs() <= COLLINEAR_EPS * scale.max(f64::MIN_POSITIVE) {
                return false;
            }
            if sign == 0.0 {
                sign = t.signum();
            } else if t.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Point-in-quad test for convex quads; boundary points count as inside.
    pub fn contains(&self, p: Point2D) -> bool {
        let b = self.corners_clockwise();
        let mut sign = 0.0f64;
        for i in 0..4 {
            let a = b[i];
            let c = b[(i + 1) % 4];
            let t = (c.x - a.x) * (p.y - a.y) - (c.y - a.y) * (p.x - a.x);
            if t == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = t.signum();
            } else if t.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Reject degenerate shapes before they reach a transform solver.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.corners().iter().all(Point2D::is_finite) {
            return Err(GeometryError::DegenerateQuad);
        }
        if self.area() < MIN_QUAD_AREA || !self.is_convex() {
            return Err(GeometryError::DegenerateQuad);
        }
        Ok(())
    }
}

/// Rectangle relative to a reference frame, every field in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    /// Clamp the pixel box `[x0, x1] × [y0, y1]` to the frame and normalise it.
    ///
    /// Returns `None` when the frame is empty or the clamped box has no area.
    pub fn from_pixel_rect(
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        let (fw, fh) = (frame_width as f64, frame_height as f64);
        let cx0 = x0.min(x1).clamp(0.0, fw);
        let cx1 = x0.max(x1).clamp(0.0, fw);
        let cy0 = y0.min(y1).clamp(0.0, fh);
        let cy1 = y0.max(y1).clamp(0.0, fh);
        if !(cx1 > cx0 && cy1 > cy0) {
            return None;
        }
        Some(Self {
            x: cx0 / fw,
            y: cy0 / fh,
            width: (cx1 - cx0) / fw,
            height: (cy1 - cy0) / fh,
        })
    }

    /// Pixel bounds `(x0, y0, x1, y1)` inside a frame of the given size.
    pub fn to_pixel_rect(&self, frame_width: usize, frame_height: usize) -> (f64, f64, f64, f64) {
        let (fw, fh) = (frame_width as f64, frame_height as f64);
        (
            self.x * fw,
            self.y * fh,
            (self.x + self.width) * fw,
            (self.y + self.height) * fh,
        )
    }
}
