mod common;

use common::synthetic_image::block_texture;
use piece_locator::features::{Feature, FeatureSet};
use piece_locator::geometry::{Point2D, Quadrilateral};
use piece_locator::matching::{FeatureMatcher, MatcherOptions};
use piece_locator::placement::{confidence_score, PlacementOptions};
use piece_locator::rectify::{output_size, rectify, RectifyOptions};
use piece_locator::{GeometryError, LocatorError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn feature(descriptor: Vec<f32>) -> Feature {
    Feature {
        location: Point2D::new(10.0, 10.0),
        response: 1.0,
        angle: 0.0,
        descriptor,
    }
}

#[test]
fn rectified_size_follows_longest_edges() {
    let image = block_texture(200, 160, 8, 1);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let mut jitter = || Point2D::new(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0));
        let (a, b, c, d) = (jitter(), jitter(), jitter(), jitter());
        let quad = Quadrilateral::new(
            Point2D::new(30.0 + a.x, 25.0 + a.y),
            Point2D::new(170.0 + b.x, 25.0 + b.y),
            Point2D::new(30.0 + c.x, 135.0 + c.y),
            Point2D::new(170.0 + d.x, 135.0 + d.y),
        );
        let out = rectify(&image, &quad, &RectifyOptions::default()).unwrap();
        let w = quad.top_length().max(quad.bottom_length());
        let h = quad.left_length().max(quad.right_length());
        assert!((out.width() as f64 - w).abs() <= 0.5, "{} vs {w}", out.width());
        assert!((out.height() as f64 - h).abs() <= 0.5, "{} vs {h}", out.height());
        assert_eq!(output_size(&quad).unwrap(), (out.width(), out.height()));
    }
}

#[test]
fn collinear_corners_are_degenerate() {
    let image = block_texture(50, 50, 5, 2);
    let quad = Quadrilateral::new(
        Point2D::new(0.0, 0.0),
        Point2D::new(20.0, 0.0),
        Point2D::new(10.0, 0.0),
        Point2D::new(30.0, 30.0),
    );
    assert_eq!(
        rectify(&image, &quad, &RectifyOptions::default()).unwrap_err(),
        LocatorError::Geometry(GeometryError::DegenerateQuad)
    );
}

#[test]
fn equidistant_neighbours_fail_ratio_test() {
    let piece = FeatureSet::new(20, 20, 1, vec![feature(vec![1.0, 0.0, 0.0, 0.0])]);
    let puzzle = FeatureSet::new(
        40,
        40,
        1,
        vec![
            feature(vec![0.0, 1.0, 0.0, 0.0]),
            feature(vec![0.0, 0.0, 1.0, 0.0]),
        ],
    );
    let matcher = FeatureMatcher::default();
    assert!(matcher.match_sets(&piece, &puzzle).unwrap().is_empty());

    let loose = FeatureMatcher::new(MatcherOptions {
        ratio_threshold: 1.0,
        ..MatcherOptions::default()
    })
    .unwrap();
    assert!(loose.match_sets(&piece, &puzzle).unwrap().is_empty());
}

#[test]
fn confidence_grows_with_inlier_ratio() {
    let opts = PlacementOptions::default();
    let mut previous = 0.0;
    for inliers in 0..=40 {
        let c = confidence_score(inliers, 40, 0.3, &opts);
        assert!(c >= previous, "confidence dropped at {inliers} inliers");
        assert!((0.0..=opts.max_confidence).contains(&c));
        previous = c;
    }
    let close = confidence_score(20, 40, 0.1, &opts);
    let far = confidence_score(20, 40, 0.9, &opts);
    assert!(close > far);
}
