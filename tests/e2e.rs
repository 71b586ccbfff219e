mod common;

use approx::assert_abs_diff_eq;
use common::init_logger;
use common::synthetic_image::{
    block_texture, flat_rgb, paste, puzzle_with_patch, quad_scene, relight, rotate90,
};
use piece_locator::detect::ContourQuadDetector;
use piece_locator::error::ExtractionError;
use piece_locator::features::{DescriptorVersion, FeatureSet, HarrisPatchExtractor};
use piece_locator::geometry::{Point2D, Quadrilateral};
use piece_locator::image::RasterImage;
use piece_locator::{
    FeatureExtractor, LocatorError, LocatorParams, MatchCandidate, PieceId, PieceLocator, PuzzleId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

fn assert_rect_near(c: &MatchCandidate, x: f64, y: f64, eps: f64) {
    assert_abs_diff_eq!(c.rect.x, x, epsilon = eps);
    assert_abs_diff_eq!(c.rect.y, y, epsilon = eps);
    assert_abs_diff_eq!(c.rect.width, 0.125, epsilon = eps);
    assert_abs_diff_eq!(c.rect.height, 0.125, epsilon = eps);
}

/// Harris extractor that counts calls on images of a given width.
struct CountingExtractor {
    inner: HarrisPatchExtractor,
    width: usize,
    calls: Arc<AtomicUsize>,
}

impl FeatureExtractor for CountingExtractor {
    fn extract(&self, image: &RasterImage) -> Result<FeatureSet, ExtractionError> {
        if image.width() == self.width {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.extract(image)
    }

    fn version(&self) -> DescriptorVersion {
        self.inner.version()
    }
}

#[test]
fn textured_patch_is_located_in_reference() {
    init_logger();
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 11);
    let piece = puzzle.crop(100, 150, 50, 50);

    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let puzzle_id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, puzzle_id.clone()).unwrap();

    let report = locator
        .locate_piece_detailed(&PieceId::new("corner"), &piece, &puzzle_id)
        .unwrap();
    assert!(
        report.piece_features >= 6,
        "too few piece features: {}",
        report.piece_features
    );
    assert_eq!(report.candidates.len(), 1, "{:?}", report.candidates);

    let best = &report.candidates[0];
    assert_eq!(best.piece_id, PieceId::new("corner"));
    assert_abs_diff_eq!(best.rect.x, 0.25, epsilon = 1e-3);
    assert_abs_diff_eq!(best.rect.y, 0.375, epsilon = 1e-3);
    assert_abs_diff_eq!(best.rect.width, 0.125, epsilon = 1e-3);
    assert_abs_diff_eq!(best.rect.height, 0.125, epsilon = 1e-3);
    assert!(best.confidence >= 0.7, "confidence {:.3}", best.confidence);
    assert!(best.confidence < 1.0);
    assert_eq!(best.inlier_count, report.correspondences);
}

#[test]
fn locating_is_deterministic() {
    init_logger();
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 23);
    let piece = puzzle.crop(100, 150, 50, 50);
    let puzzle_id = PuzzleId::new("box");
    let piece_id = PieceId::new("p");

    let first = PieceLocator::new(LocatorParams::default()).unwrap();
    first.build_feature_index(puzzle.clone(), puzzle_id.clone()).unwrap();
    let a = first.locate_piece(&piece_id, &piece, &puzzle_id).unwrap();
    let b = first.locate_piece(&piece_id, &piece, &puzzle_id).unwrap();

    let second = PieceLocator::new(LocatorParams::default()).unwrap();
    second.build_feature_index(puzzle, puzzle_id.clone()).unwrap();
    let c = second.locate_piece(&piece_id, &piece, &puzzle_id).unwrap();

    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&c).unwrap()
    );
}

#[test]
fn unindexed_puzzle_is_reported() {
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let piece = puzzle_with_patch(60, 50, 5, 5, 3);
    let err = locator
        .locate_piece(&PieceId::new("p"), &piece, &PuzzleId::new("nope"))
        .unwrap_err();
    assert_eq!(
        err,
        LocatorError::NotIndexed {
            puzzle_id: "nope".to_string()
        }
    );
    assert!(locator
        .analyze(&PuzzleId::new("nope"), &[(PieceId::new("p"), piece)])
        .is_err());
}

#[test]
fn invalidated_puzzle_must_be_reindexed() {
    let puzzle = puzzle_with_patch(200, 50, 40, 60, 5);
    let piece = puzzle.crop(40, 60, 50, 50);
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, id.clone()).unwrap();
    assert!(locator.locate_piece(&PieceId::new("p"), &piece, &id).is_ok());

    assert!(locator.invalidate(&id));
    assert!(matches!(
        locator.locate_piece(&PieceId::new("p"), &piece, &id),
        Err(LocatorError::NotIndexed { .. })
    ));
}

#[test]
fn analyze_keeps_submission_order() {
    init_logger();
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 11);
    let pieces = vec![
        (PieceId::new("z-real"), puzzle.crop(100, 150, 50, 50)),
        (PieceId::new("a-blank"), puzzle.crop(300, 300, 50, 50)),
    ];
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, id.clone()).unwrap();

    let result = locator.analyze(&id, &pieces).unwrap();
    assert_eq!(result.puzzle_id, id);
    assert_eq!(
        result.piece_ids,
        vec![PieceId::new("z-real"), PieceId::new("a-blank")]
    );
    assert_eq!(result.located_count(), 1);
    let best = result.best_match(&PieceId::new("z-real")).unwrap();
    assert_abs_diff_eq!(best.rect.x, 0.25, epsilon = 1e-3);
    assert!(result.matches[&PieceId::new("a-blank")].is_empty());
}

#[test]
fn tilted_box_is_rectified() {
    init_logger();
    let quad = Quadrilateral::new(
        Point2D::new(60.0, 50.0),
        Point2D::new(330.0, 70.0),
        Point2D::new(70.0, 240.0),
        Point2D::new(310.0, 260.0),
    );
    let photo = quad_scene(400, 300, &quad, 210, 40);
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();

    let found = locator.detect_quad(&photo).expect("quad should be detected");
    for (got, want) in found.corners().iter().zip(quad.corners()) {
        assert!(
            (got.x - want.x).abs() <= 3.0 && (got.y - want.y).abs() <= 3.0,
            "corner {got:?} too far from {want:?}"
        );
    }

    let region = locator.extract_reference_region(&photo).unwrap();
    let expected_w = quad.top_length().max(quad.bottom_length());
    let expected_h = quad.left_length().max(quad.right_length());
    assert!((region.width() as f64 - expected_w).abs() <= 6.0, "width {}", region.width());
    assert!((region.height() as f64 - expected_h).abs() <= 6.0, "height {}", region.height());
    assert_eq!(region.pixel(region.width() / 2, region.height() / 2), &[210]);
}

#[test]
fn plain_photo_falls_back_to_center_square() {
    let data: Vec<u8> = (0..80).flat_map(|_| (0..120).map(|x| (x * 2) as u8)).collect();
    let photo = RasterImage::gray(120, 80, data).unwrap();
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let region = locator.extract_reference_region(&photo).unwrap();
    assert_eq!((region.width(), region.height()), (80, 80));
    assert_eq!(region, photo.crop(20, 0, 80, 80));
}

#[test]
fn repeated_patch_yields_a_candidate_per_copy() {
    init_logger();
    let patch = block_texture(50, 50, 5, 11);
    let background = flat_rgb(400, 400, [128, 128, 128]);
    let puzzle = paste(&paste(&background, &patch, 100, 150), &patch, 250, 40);
    let piece = puzzle.crop(100, 150, 50, 50);

    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let id = PuzzleId::new("twins");
    locator.build_feature_index(puzzle, id.clone()).unwrap();

    let mut got = locator.locate_piece(&PieceId::new("p"), &piece, &id).unwrap();
    assert_eq!(got.len(), 2, "{got:?}");
    got.sort_by(|a, b| a.rect.x.total_cmp(&b.rect.x));
    assert_rect_near(&got[0], 0.25, 0.375, 1e-3);
    assert_rect_near(&got[1], 0.625, 0.1, 1e-3);
}

#[test]
fn rotated_piece_is_located() {
    init_logger();
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 11);
    let piece = rotate90(&puzzle.crop(100, 150, 50, 50));
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, id.clone()).unwrap();

    let got = locator.locate_piece(&PieceId::new("r"), &piece, &id).unwrap();
    assert!(!got.is_empty());
    assert_rect_near(&got[0], 0.25, 0.375, 1e-2);
}

#[test]
fn relit_piece_is_located() {
    init_logger();
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 11);
    let piece = relight(&puzzle.crop(100, 150, 50, 50), 0.6, 30.0);
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, id.clone()).unwrap();

    let got = locator.locate_piece(&PieceId::new("l"), &piece, &id).unwrap();
    assert!(!got.is_empty());
    assert_rect_near(&got[0], 0.25, 0.375, 1e-2);
    assert!(got[0].confidence >= 0.3, "confidence {:.3}", got[0].confidence);
}

#[test]
fn concurrent_first_locates_share_one_extraction() {
    init_logger();
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 11);
    let piece = puzzle.crop(100, 150, 50, 50);
    let calls = Arc::new(AtomicUsize::new(0));
    let params = LocatorParams::default();
    let locator = PieceLocator::with_components(
        params.clone(),
        Box::new(ContourQuadDetector::new(params.detector.clone()).unwrap()),
        Box::new(CountingExtractor {
            inner: HarrisPatchExtractor::new(params.features.clone()).unwrap(),
            width: 400,
            calls: Arc::clone(&calls),
        }),
    )
    .unwrap();
    let id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, id.clone()).unwrap();

    let threads = 8;
    let barrier = Barrier::new(threads);
    let (locator, piece, id, barrier) = (&locator, &piece, &id, &barrier);
    let results: Vec<Vec<MatchCandidate>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(move || {
                    barrier.wait();
                    locator.locate_piece(&PieceId::new("p"), &piece, &id).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!results[0].is_empty());
    assert!(results.iter().all(|r| r == &results[0]));
}

#[test]
fn analyze_agrees_with_single_locates() {
    let puzzle = puzzle_with_patch(400, 50, 100, 150, 19);
    let pieces: Vec<(PieceId, RasterImage)> = [(100, 150), (90, 140), (300, 300)]
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| (PieceId::new(format!("p{i}")), puzzle.crop(x, y, 50, 50)))
        .collect();
    let locator = PieceLocator::new(LocatorParams::default()).unwrap();
    let id = PuzzleId::new("box");
    locator.build_feature_index(puzzle, id.clone()).unwrap();

    let batch = locator.analyze(&id, &pieces).unwrap();
    for (piece_id, image) in &pieces {
        let single = locator.locate_piece(piece_id, image, &id).unwrap();
        assert_eq!(batch.matches[piece_id], single, "piece {piece_id}");
    }
}
