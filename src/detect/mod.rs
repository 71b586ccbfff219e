//! Quadrilateral detection: finds the outline of the rectangular object
//! (puzzle box, printed picture) that dominates a photo.
//!
//! [`QuadDetector`] is the seam for platform rectangle detectors. The bundled
//! [`ContourQuadDetector`] works on a downscaled luma image:
//!
//! 1. Otsu threshold, then for each polarity the regions enclosed by the
//!    border-connected background (holes inside the object are filled).
//! 2. Convex hull of each region, simplified, then the largest quadrilateral
//!    with vertices on the hull.
//! 3. Reject on fill ratio (quad area / hull area), relative size, aspect
//!    ratio and corner angles.
//! 4. Largest surviving quad wins; near-equal areas prefer the one closest to
//!    the image centre.
//!
//! No randomness is involved: the same image and options always give the
//! same result.

pub(crate) mod contour;
pub(crate) mod hull;
pub mod options;

pub use options::QuadDetectorOptions;

use crate::error::ConfigurationError;
use crate::geometry::{distance, Point2D, Quadrilateral};
use crate::image::RasterImage;
use crate::pyramid::Pyramid;
use contour::{enclosed_regions, otsu_threshold, Region};
use hull::{convex_hull, max_area_quad, polygon_area, simplify_hull};
use log::debug;

pub trait QuadDetector: Send + Sync {
    /// Best candidate quadrilateral in source pixel coordinates, or `None`.
    fn detect(&self, image: &RasterImage) -> Option<Quadrilateral>;
}

/// Order four arbitrary corner points as TL, TR, BL, BR.
///
/// Points are sorted clockwise (on screen) around their centroid; the one
/// with the smallest `x + y` becomes top-left, ties going to the smaller `y`.
pub fn order_corners(points: [Point2D; 4]) -> Quadrilateral {
    let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mut pts = points;
    pts.sort_by(|a, b| {
        let ta = (a.y - cy).atan2(a.x - cx);
        let tb = (b.y - cy).atan2(b.x - cx);
        ta.total_cmp(&tb)
    });
    let mut start = 0;
    for i in 1..4 {
        let (p, s) = (pts[i], pts[start]);
        let (sp, ss) = (p.x + p.y, s.x + s.y);
        if sp < ss || (sp == ss && p.y < s.y) {
            start = i;
        }
    }
    Quadrilateral::new(
        pts[start],
        pts[(start + 1) % 4],
        pts[(start + 3) % 4],
        pts[(start + 2) % 4],
    )
}

#[derive(Clone, Debug)]
struct Candidate {
    quad: Quadrilateral,
    area: f64,
    centre_distance: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ContourQuadDetector {
    options: QuadDetectorOptions,
}

impl ContourQuadDetector {
    pub fn new(options: QuadDetectorOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &QuadDetectorOptions {
        &self.options
    }

    fn corner_angles_ok(&self, quad: &Quadrilateral) -> bool {
        let b = quad.corners_clockwise();
        let lo = self.options.min_corner_angle_deg;
        let hi = 180.0 - lo;
        (0..4).all(|i| {
            let prev = b[(i + 3) % 4];
            let cur = b[i];
            let next = b[(i + 1) % 4];
            let (ux, uy) = (prev.x - cur.x, prev.y - cur.y);
            let (vx, vy) = (next.x - cur.x, next.y - cur.y);
            let denom = distance(prev, cur) * distance(next, cur);
            if denom <= f64::EPSILON {
                return false;
            }
            let cos = ((ux * vx + uy * vy) / denom).clamp(-1.0, 1.0);
            let deg = cos.acos().to_degrees();
            deg >= lo && deg <= hi
        })
    }

    /// Score one region in working-level coordinates.
    fn evaluate(&self, region: &Region, w: usize, h: usize) -> Option<Candidate> {
        let opts = &self.options;
        let mut points = Vec::with_capacity(region.rows.len() * 4);
        for (&y, &(x0, x1)) in &region.rows {
            let (y0, y1) = (y as f64, y as f64 + 1.0);
            let (xl, xr) = (x0 as f64, x1 as f64 + 1.0);
            points.extend([
                Point2D::new(xl, y0),
                Point2D::new(xl, y1),
                Point2D::new(xr, y0),
                Point2D::new(xr, y1),
            ]);
        }
        let hull = convex_hull(&points);
        let hull_area = polygon_area(&hull);
        if hull_area <= 0.0 {
            return None;
        }
        let simplified = simplify_hull(&hull, opts.max_hull_vertices);
        let (corners, area) = max_area_quad(&simplified)?;

        let fill = area / hull_area;
        if fill < opts.min_fill_ratio {
            debug!(
                "ContourQuadDetector: region of {} px rejected, fill ratio {:.3}",
                region.pixel_count, fill
            );
            return None;
        }
        let relative = area / (w * h) as f64;
        if relative < opts.min_relative_size {
            debug!(
                "ContourQuadDetector: region of {} px rejected, relative size {:.3}",
                region.pixel_count, relative
            );
            return None;
        }
        let quad = order_corners(corners);
        let aspect = quad.aspect_ratio();
        if !(opts.min_aspect_ratio..=opts.max_aspect_ratio).contains(&aspect) {
            debug!(
                "ContourQuadDetector: region of {} px rejected, aspect {:.3}",
                region.pixel_count, aspect
            );
            return None;
        }
        if !self.corner_angles_ok(&quad) || quad.validate().is_err() {
            debug!(
                "ContourQuadDetector: region of {} px rejected, corner geometry",
                region.pixel_count
            );
            return None;
        }
        let centre = Point2D::new(0.5 * w as f64, 0.5 * h as f64);
        Some(Candidate {
            quad,
            area,
            centre_distance: distance(quad.centroid(), centre),
        })
    }
}

/// `a` beats `b`: larger area, or within 1 px² and closer to the centre.
fn prefer(a: &Candidate, b: &Candidate, area_scale: f64) -> bool {
    let diff = (a.area - b.area) * area_scale;
    if diff.abs() <= 1.0 {
        a.centre_distance < b.centre_distance
    } else {
        diff > 0.0
    }
}

impl QuadDetector for ContourQuadDetector {
    fn detect(&self, image: &RasterImage) -> Option<Quadrilateral> {
        if image.width() < 3 || image.height() < 3 {
            return None;
        }
        let pyramid = Pyramid::build_to_max_side(image.to_luma(), self.options.working_max_side);
        let level = pyramid.coarsest()?;
        let scale = Pyramid::scale_to_base(pyramid.coarsest_index());
        let (w, h) = (level.w, level.h);

        let t = otsu_threshold(level);
        let bright: Vec<bool> = level.data.iter().map(|&v| v > t).collect();
        let dark: Vec<bool> = bright.iter().map(|b| !b).collect();
        let min_pixels = ((self.options.min_relative_size
            * self.options.min_fill_ratio
            * (w * h) as f64)
            .floor() as usize)
            .max(1);

        let mut best: Option<Candidate> = None;
        let mut considered = 0usize;
        for mask in [&bright, &dark] {
            for region in enclosed_regions(mask, w, h, min_pixels) {
                considered += 1;
                if let Some(c) = self.evaluate(&region, w, h) {
                    if best.as_ref().map_or(true, |b| prefer(&c, b, scale * scale)) {
                        best = Some(c);
                    }
                }
            }
        }

        let (fw, fh) = (image.width() as f64, image.height() as f64);
        let found = best.map(|c| {
            let q = c.quad.scaled(scale, scale);
            let clamp = |p: Point2D| Point2D::new(p.x.clamp(0.0, fw), p.y.clamp(0.0, fh));
            Quadrilateral::new(
                clamp(q.top_left),
                clamp(q.top_right),
                clamp(q.bottom_left),
                clamp(q.bottom_right),
            )
        });
        debug!(
            "ContourQuadDetector::detect {}x{} level={} threshold={:.3} regions={} found={}",
            image.width(),
            image.height(),
            pyramid.coarsest_index(),
            t,
            considered,
            found.is_some()
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with(w: usize, h: usize, inside: impl Fn(f64, f64) -> bool) -> RasterImage {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let v = if inside(x as f64 + 0.5, y as f64 + 0.5) { 220 } else { 30 };
                data.push(v);
            }
        }
        RasterImage::gray(w, h, data).unwrap()
    }

    #[test]
    fn orders_shuffled_corners() {
        let q = order_corners([
            Point2D::new(90.0, 80.0),
            Point2D::new(10.0, 5.0),
            Point2D::new(5.0, 70.0),
            Point2D::new(95.0, 10.0),
        ]);
        assert_eq!(q.top_left, Point2D::new(10.0, 5.0));
        assert_eq!(q.top_right, Point2D::new(95.0, 10.0));
        assert_eq!(q.bottom_left, Point2D::new(5.0, 70.0));
        assert_eq!(q.bottom_right, Point2D::new(90.0, 80.0));
    }

    #[test]
    fn orders_diamond_deterministically() {
        let q = order_corners([
            Point2D::new(50.0, 100.0),
            Point2D::new(0.0, 50.0),
            Point2D::new(100.0, 50.0),
            Point2D::new(50.0, 0.0),
        ]);
        assert_eq!(q.top_left, Point2D::new(50.0, 0.0));
        assert_eq!(q.top_right, Point2D::new(100.0, 50.0));
        assert_eq!(q.bottom_right, Point2D::new(50.0, 100.0));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn finds_axis_aligned_rectangle() {
        let img = canvas_with(300, 200, |x, y| (60.0..240.0).contains(&x) && (40.0..160.0).contains(&y));
        let q = ContourQuadDetector::default().detect(&img).unwrap();
        assert!((q.top_left.x - 60.0).abs() <= 1.0 && (q.top_left.y - 40.0).abs() <= 1.0);
        assert!((q.bottom_right.x - 240.0).abs() <= 1.0 && (q.bottom_right.y - 160.0).abs() <= 1.0);
    }

    #[test]
    fn uniform_image_has_no_quad() {
        let img = RasterImage::gray(120, 90, vec![128; 120 * 90]).unwrap();
        assert!(ContourQuadDetector::default().detect(&img).is_none());
    }

    #[test]
    fn small_object_is_rejected() {
        let img = canvas_with(300, 300, |x, y| (100.0..140.0).contains(&x) && (100.0..140.0).contains(&y));
        assert!(ContourQuadDetector::default().detect(&img).is_none());
    }

    #[test]
    fn disc_is_not_a_quad() {
        let img = canvas_with(200, 200, |x, y| (x - 100.0).powi(2) + (y - 100.0).powi(2) < 80.0 * 80.0);
        assert!(ContourQuadDetector::default().detect(&img).is_none());
    }

    #[test]
    fn equal_boxes_resolve_to_the_central_one() {
        let a = |x: f64, y: f64| (40.0..140.0).contains(&x) && (40.0..120.0).contains(&y);
        let b = |x: f64, y: f64| (200.0..300.0).contains(&x) && (120.0..200.0).contains(&y);
        let img = canvas_with(400, 300, |x, y| a(x, y) || b(x, y));
        let detector = ContourQuadDetector::new(QuadDetectorOptions {
            min_relative_size: 0.05,
            ..QuadDetectorOptions::default()
        })
        .unwrap();
        let q = detector.detect(&img).unwrap();
        assert!((q.top_left.x - 200.0).abs() <= 1.0 && (q.top_left.y - 120.0).abs() <= 1.0);
        assert!((q.bottom_right.x - 300.0).abs() <= 1.0 && (q.bottom_right.y - 200.0).abs() <= 1.0);
    }

    #[test]
    fn near_equal_areas_prefer_smaller_centre_distance() {
        let quad = order_corners([
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 10.0),
            Point2D::new(10.0, 10.0),
        ]);
        let near = Candidate {
            quad,
            area: 100.0,
            centre_distance: 5.0,
        };
        let far = Candidate {
            quad,
            area: 100.5,
            centre_distance: 50.0,
        };
        assert!(prefer(&near, &far, 1.0));
        assert!(!prefer(&far, &near, 1.0));
        // once scaled to full resolution the gap exceeds the tie window
        assert!(prefer(&far, &near, 4.0));
    }

    #[test]
    fn elongated_strip_fails_aspect_limits() {
        let img = canvas_with(400, 300, |x, y| (20.0..380.0).contains(&x) && (120.0..230.0).contains(&y));
        assert!(ContourQuadDetector::default().detect(&img).is_none());
    }
}
