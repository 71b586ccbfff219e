//! Seeded consensus search over similarity / affine hypotheses.

use super::PlacementOptions;
use crate::geometry::{distance, estimate_transform, Point2D, Transform2D};
use rand::rngs::StdRng;
use rand::Rng;

/// Correspondence reduced to the coordinates the search needs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PointPair {
    pub src: Point2D,
    pub dst: Point2D,
}

#[derive(Clone, Debug)]
pub(crate) struct Hypothesis {
    pub transform: Transform2D,
    /// Indices into the caller's pair slice, ascending.
    pub inliers: Vec<usize>,
}

fn plausible(t: &Transform2D, opts: &PlacementOptions) -> bool {
    let s = t.scale();
    t.is_finite() && s >= opts.min_scale && s <= opts.max_scale
}

fn inliers_of(
    t: &Transform2D,
    pairs: &[PointPair],
    active: &[usize],
    tolerance: f64,
) -> Vec<usize> {
    active
        .iter()
        .copied()
        .filter(|&i| distance(t.map_point(pairs[i].src), pairs[i].dst) <= tolerance)
        .collect()
}

/// Draw `k` distinct positions in `0..n`. `n >= k` is guaranteed by callers.
fn draw_distinct(rng: &mut StdRng, n: usize, k: usize, out: &mut Vec<usize>) {
    out.clear();
    while out.len() < k {
        let i = rng.gen_range(0..n);
        if !out.contains(&i) {
            out.push(i);
        }
    }
}

/// Number of draws needed to hit an all-inlier sample with the configured
/// probability, given the current inlier fraction.
fn adaptive_iterations(inlier_fraction: f64, k: usize, opts: &PlacementOptions) -> usize {
    let w = inlier_fraction.clamp(0.0, 1.0).powi(k as i32);
    if w >= 1.0 - 1e-12 {
        return 1;
    }
    if w <= 1e-12 {
        return opts.max_iterations;
    }
    let n = (1.0 - opts.success_probability).ln() / (1.0 - w).ln();
    if n.is_finite() {
        (n.ceil() as usize).clamp(1, opts.max_iterations)
    } else {
        opts.max_iterations
    }
}

/// Best hypothesis over the `active` subset of `pairs`, refit by least
/// squares on its inliers. `None` when no minimal sample produced a
/// plausible transform.
pub(crate) fn search(
    rng: &mut StdRng,
    pairs: &[PointPair],
    active: &[usize],
    opts: &PlacementOptions,
) -> Option<Hypothesis> {
    let k = opts.model.min_samples();
    let n = active.len();
    if n < k {
        return None;
    }

    let mut best: Option<Hypothesis> = None;
    let mut needed = opts.max_iterations;
    let mut picks = Vec::with_capacity(k);
    let mut src = Vec::with_capacity(k);
    let mut dst = Vec::with_capacity(k);
    let mut iter = 0;
    while iter < needed {
        iter += 1;
        draw_distinct(rng, n, k, &mut picks);
        src.clear();
        dst.clear();
        for &p in &picks {
            let pair = pairs[active[p]];
            src.push(pair.src);
            dst.push(pair.dst);
        }
        let Ok(t) = estimate_transform(opts.model, &src, &dst) else {
            continue;
        };
        if !plausible(&t, opts) {
            continue;
        }
        let inliers = inliers_of(&t, pairs, active, opts.inlier_tolerance_px);
        if best.as_ref().map_or(true, |b| inliers.len() > b.inliers.len()) {
            needed = adaptive_iterations(inliers.len() as f64 / n as f64, k, opts);
            best = Some(Hypothesis {
                transform: t,
                inliers,
            });
        }
    }

    let mut best = best?;
    if best.inliers.len() > k {
        let src: Vec<_> = best.inliers.iter().map(|&i| pairs[i].src).collect();
        let dst: Vec<_> = best.inliers.iter().map(|&i| pairs[i].dst).collect();
        if let Ok(refit) = estimate_transform(opts.model, &src, &dst) {
            if plausible(&refit, opts) {
                let inliers = inliers_of(&refit, pairs, active, opts.inlier_tolerance_px);
                if inliers.len() >= best.inliers.len() {
                    best = Hypothesis {
                        transform: refit,
                        inliers,
                    };
                }
            }
        }
    }
    Some(best)
}
