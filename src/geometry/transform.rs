//! Planar transforms: full projective homographies solved from four point
//! pairs, and least-squares similarity / affine fits used by placement.

use super::Point2D;
use crate::error::GeometryError;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-12;

/// 3×3 projective transform with `h[2][2]` normalised to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self, GeometryError> {
        let w = m[(2, 2)];
        if !w.is_finite() || w.abs() <= EPS || m.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::SingularTransform);
        }
        Ok(Self { m: m / w })
    }

    /// Exact projective map sending `src[i]` to `dst[i]` for all four pairs.
    ///
    /// Builds the usual 8×8 DLT system with `h22 = 1` and solves it by LU.
    /// Three collinear points on either side make the system singular.
    pub fn from_point_pairs(src: &[Point2D; 4], dst: &[Point2D; 4]) -> Result<Self, GeometryError> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for i in 0..4 {
            let (x, y) = (src[i].x, src[i].y);
            let (u, v) = (dst[i].x, dst[i].y);
            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;
            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }
        let h = a.lu().solve(&b).ok_or(GeometryError::SingularTransform)?;
        let m = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        let out = Self::from_matrix(m)?;
        // LU happily returns garbage for nearly singular systems
        for i in 0..4 {
            let p = out.map_point(src[i]).ok_or(GeometryError::SingularTransform)?;
            let tol = 1e-6 * (1.0 + dst[i].x.abs().max(dst[i].y.abs()));
            if (p.x - dst[i].x).abs() > tol || (p.y - dst[i].y).abs() > tol {
                return Err(GeometryError::SingularTransform);
            }
        }
        Ok(out)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// `None` when the point maps to infinity.
    pub fn map_point(&self, p: Point2D) -> Option<Point2D> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        Some(Point2D::new(v[0] / w, v[1] / w))
    }

    pub fn inverse(&self) -> Option<Homography> {
        self.m
            .try_inverse()
            .and_then(|inv| Homography::from_matrix(inv).ok())
    }
}

/// Parametric family fitted by the placement stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformModel {
    /// Rotation, uniform scale and translation (4 DOF).
    #[default]
    Similarity,
    /// General 2×3 affine map (6 DOF).
    Affine,
}

impl TransformModel {
    /// Size of a minimal sample.
    pub fn min_samples(self) -> usize {
        match self {
            TransformModel::Similarity => 2,
            TransformModel::Affine => 3,
        }
    }
}

/// Row-major 2×3 affine matrix; similarities are stored the same way.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub model: TransformModel,
    pub m: [[f64; 3]; 2],
}

impl Transform2D {
    #[inline]
    pub fn map_point(&self, p: Point2D) -> Point2D {
        let m = &self.m;
        Point2D::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2],
        )
    }

    pub fn determinant(&self) -> f64 {
        self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0]
    }

    /// Geometric mean scale factor, `sqrt(|det|)`.
    pub fn scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|v| v.is_finite())
    }

    /// Homogeneous 3×3 form, row-major.
    pub fn to_matrix3(&self) -> [[f64; 3]; 3] {
        [self.m[0], self.m[1], [0.0, 0.0, 1.0]]
    }
}

fn centroid(pts: &[Point2D]) -> Point2D {
    let n = pts.len() as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(ax, ay), p| (ax + p.x, ay + p.y));
    Point2D::new(sx / n, sy / n)
}

/// Least-squares similarity `dst ≈ s·R·src + t` over at least two pairs.
///
/// Reflections are not modelled. Coincident source points leave the
/// rotation undetermined and fail with [`GeometryError::SingularTransform`].
pub fn estimate_similarity(src: &[Point2D], dst: &[Point2D]) -> Result<Transform2D, GeometryError> {
    if src.len() != dst.len() || src.len() < 2 {
        return Err(GeometryError::SingularTransform);
    }
    let cs = centroid(src);
    let cd = centroid(dst);
    let (mut num_a, mut num_b, mut den) = (0.0, 0.0, 0.0);
    for (p, q) in src.iter().zip(dst) {
        let (px, py) = (p.x - cs.x, p.y - cs.y);
        let (qx, qy) = (q.x - cd.x, q.y - cd.y);
        num_a += px * qx + py * qy;
        num_b += px * qy - py * qx;
        den += px * px + py * py;
    }
    if den <= EPS {
        return Err(GeometryError::SingularTransform);
    }
    let a = num_a / den;
    let b = num_b / den;
    let tx = cd.x - (a * cs.x - b * cs.y);
    let ty = cd.y - (b * cs.x + a * cs.y);
    let t = Transform2D {
        model: TransformModel::Similarity,
        m: [[a, -b, tx], [b, a, ty]],
    };
    if !t.is_finite() || t.scale() <= EPS {
        return Err(GeometryError::SingularTransform);
    }
    Ok(t)
}

/// Least-squares affine fit over at least three non-collinear pairs.
pub fn estimate_affine(src: &[Point2D], dst: &[Point2D]) -> Result<Transform2D, GeometryError> {
    if src.len() != dst.len() || src.len() < 3 {
        return Err(GeometryError::SingularTransform);
    }
    // centre both sets so the normal equations stay well conditioned
    let cs = centroid(src);
    let cd = centroid(dst);
    let mut ata = Matrix3::<f64>::zeros();
    let mut atu = Vector3::<f64>::zeros();
    let mut atv = Vector3::<f64>::zeros();
    for (p, q) in src.iter().zip(dst) {
        let r = Vector3::new(p.x - cs.x, p.y - cs.y, 1.0);
        ata += r * r.transpose();
        atu += r * (q.x - cd.x);
        atv += r * (q.y - cd.y);
    }
    let spread = ata[(0, 0)] + ata[(1, 1)];
    let det = ata[(0, 0)] * ata[(1, 1)] - ata[(0, 1)] * ata[(1, 0)];
    if spread <= EPS || det <= 1e-9 * spread * spread {
        return Err(GeometryError::SingularTransform);
    }
    let lu = ata.lu();
    let row_x = lu.solve(&atu).ok_or(GeometryError::SingularTransform)?;
    let row_y = lu.solve(&atv).ok_or(GeometryError::SingularTransform)?;
    let (a, b, c, d) = (row_x[0], row_x[1], row_y[0], row_y[1]);
    let t = Transform2D {
        model: TransformModel::Affine,
        m: [
            [a, b, cd.x + row_x[2] - (a * cs.x + b * cs.y)],
            [c, d, cd.y + row_y[2] - (c * cs.x + d * cs.y)],
        ],
    };
    if !t.is_finite() || t.scale() <= EPS {
        return Err(GeometryError::SingularTransform);
    }
    Ok(t)
}

/// Dispatch on the model family.
pub fn estimate_transform(
    model: TransformModel,
    src: &[Point2D],
    dst: &[Point2D],
) -> Result<Transform2D, GeometryError> {
    match model {
        TransformModel::Similarity => estimate_similarity(src, dst),
        TransformModel::Affine => estimate_affine(src, dst),
    }
}
