//! Convex hull and largest inscribed quadrilateral.

use crate::geometry::{signed_area, turn, Point2D};

/// Andrew's monotone chain. Collinear points are dropped; the result has
/// consistent winding and no repeated closing vertex.
pub(crate) fn convex_hull(points: &[Point2D]) -> Vec<Point2D> {
    let mut pts: Vec<Point2D> = points.iter().copied().filter(Point2D::is_finite).collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point2D> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point2D> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Drop the vertex whose removal loses the least area until at most
/// `max_vertices` remain. Corners of a quad-like hull survive.
pub(crate) fn simplify_hull(hull: &[Point2D], max_vertices: usize) -> Vec<Point2D> {
    let mut poly = hull.to_vec();
    let limit = max_vertices.max(4);
    while poly.len() > limit {
        let n = poly.len();
        let mut best = 0;
        let mut best_loss = f64::INFINITY;
        for i in 0..n {
            let loss = turn(poly[(i + n - 1) % n], poly[i], poly[(i + 1) % n]).abs();
            if loss < best_loss {
                best_loss = loss;
                best = i;
            }
        }
        poly.remove(best);
    }
    poly
}

fn triangle_area(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    0.5 * turn(a, b, c).abs()
}

/// Largest-area quadrilateral with vertices on `hull` (convex, in winding
/// order). Returns the four vertices in hull order and the area.
pub(crate) fn max_area_quad(hull: &[Point2D]) -> Option<([Point2D; 4], f64)> {
    let n = hull.len();
    if n < 4 {
        return None;
    }
    let mut best: Option<([usize; 4], f64)> = None;
    for i in 0..n {
        for k in i + 2..n {
            // left chain strictly between i and k, right chain wraps past n
            if i == 0 && k == n - 1 {
                continue;
            }
            let (mut bj, mut aj) = (i + 1, -1.0);
            for j in i + 1..k {
                let a = triangle_area(hull[i], hull[j], hull[k]);
                if a > aj {
                    aj = a;
                    bj = j;
                }
            }
            let (mut bl, mut al) = (k + 1, -1.0);
            for l in k + 1..n + i {
                let a = triangle_area(hull[k], hull[l % n], hull[i]);
                if a > al {
                    al = a;
                    bl = l % n;
                }
            }
            let area = aj + al;
            if best.map_or(true, |(_, b)| area > b) {
                best = Some(([i, bj, k, bl], area));
            }
        }
    }
    best.map(|(idx, area)| (idx.map(|i| hull[i]), area))
}

pub(crate) fn polygon_area(poly: &[Point2D]) -> f64 {
    signed_area(poly).abs()
}
