//! Binarisation and connected regions for the quad detector.

use crate::image::{ImageView, LumaImage};
use std::collections::BTreeMap;

/// Otsu threshold over a 256-bin histogram; pixels `> t` are the bright class.
pub(crate) fn otsu_threshold(img: &LumaImage) -> f32 {
    let mut hist = [0u64; 256];
    for y in 0..img.h {
        for &v in img.row(y) {
            let bin = (v.clamp(0.0, 1.0) * 255.0).round() as usize;
            hist[bin] += 1;
        }
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0.5;
    }
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best_t = 0usize;
    let mut best_var = -1.0f64;
    let mut w0 = 0u64;
    let mut sum0 = 0.0f64;
    for (t, &count) in hist.iter().enumerate() {
        w0 += count;
        sum0 += t as f64 * count as f64;
        if w0 == 0 {
            continue;
        }
        let w1 = total - w0;
        if w1 == 0 {
            // everything at or below t: no bright class at all
            if best_var < 0.0 {
                best_t = t;
            }
            break;
        }
        let m0 = sum0 / w0 as f64;
        let m1 = (sum_all - sum0) / w1 as f64;
        let var = w0 as f64 * w1 as f64 * (m0 - m1) * (m0 - m1);
        if var > best_var {
            best_var = var;
            best_t = t;
        }
    }
    (best_t as f32 + 0.5) / 255.0
}

/// A connected region described by its per-row horizontal extent.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Region {
    pub pixel_count: usize,
    /// `y → (x_min, x_max)`, inclusive.
    pub rows: BTreeMap<usize, (usize, usize)>,
}

const NEIGHBOURS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn flood(
    seed: usize,
    w: usize,
    h: usize,
    passable: impl Fn(usize) -> bool,
    visited: &mut [bool],
    mut visit: impl FnMut(usize),
) {
    let mut stack = vec![seed];
    visited[seed] = true;
    while let Some(i) = stack.pop() {
        visit(i);
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        for (dx, dy) in NEIGHBOURS {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                continue;
            }
            let j = ny as usize * w + nx as usize;
            if !visited[j] && passable(j) {
                visited[j] = true;
                stack.push(j);
            }
        }
    }
}

/// Regions enclosed by the `mask` class.
///
/// Pixels of `mask` 4-connected to the image border form the background;
/// every other pixel (including holes of the opposite class inside an
/// object) is foreground. Foreground regions touching the border or holding
/// fewer than `min_pixels` pixels are dropped.
pub(crate) fn enclosed_regions(mask: &[bool], w: usize, h: usize, min_pixels: usize) -> Vec<Region> {
    let n = w * h;
    if n == 0 || mask.len() != n {
        return Vec::new();
    }

    let mut background = vec![false; n];
    let border = (0..w)
        .flat_map(|x| [x, (h - 1) * w + x])
        .chain((0..h).flat_map(|y| [y * w, y * w + w - 1]));
    for i in border {
        if mask[i] && !background[i] {
            flood(i, w, h, |j| mask[j], &mut background, |_| {});
        }
    }

    let mut visited = background;
    let mut regions = Vec::new();
    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        let mut touches_border = false;
        let mut rows: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        let mut count = 0usize;
        flood(
            seed,
            w,
            h,
            |_| true,
            &mut visited,
            |i| {
                let (x, y) = (i % w, i / w);
                if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                    touches_border = true;
                }
                count += 1;
                rows.entry(y)
                    .and_modify(|e| {
                        e.0 = e.0.min(x);
                        e.1 = e.1.max(x);
                    })
                    .or_insert((x, x));
            },
        );
        if !touches_border && count >= min_pixels {
            regions.push(Region {
                pixel_count: count,
                rows,
            });
        }
    }
    regions
}
