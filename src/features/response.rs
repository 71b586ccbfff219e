//! Harris corner response and keypoint selection.
//!
//! The structure tensor is accumulated from Sobel derivatives and smoothed
//! with the 5-tap Gaussian. Selection keeps strict local maxima of the
//! response in a square window; plateaus resolve to the first pixel in
//! raster order.

use super::gradient::sobel_gradients;
use crate::image::LumaImage;
use crate::pyramid::filters::{apply as apply_filter, GAUSSIAN_5TAP};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Keypoint {
    pub x: usize,
    pub y: usize,
    pub response: f32,
}

pub(crate) fn harris_response(luma: &LumaImage, k: f32) -> LumaImage {
    let g = sobel_gradients(luma);
    let n = luma.w * luma.h;
    let mut ixx = LumaImage::new(luma.w, luma.h);
    let mut iyy = LumaImage::new(luma.w, luma.h);
    let mut ixy = LumaImage::new(luma.w, luma.h);
    for i in 0..n {
        let (dx, dy) = (g.gx.data[i], g.gy.data[i]);
        ixx.data[i] = dx * dx;
        iyy.data[i] = dy * dy;
        ixy.data[i] = dx * dy;
    }
    let sxx = apply_filter(&GAUSSIAN_5TAP, &ixx);
    let syy = apply_filter(&GAUSSIAN_5TAP, &iyy);
    let sxy = apply_filter(&GAUSSIAN_5TAP, &ixy);

    let mut out = LumaImage::new(luma.w, luma.h);
    for i in 0..n {
        let (a, b, c) = (sxx.data[i], syy.data[i], sxy.data[i]);
        let trace = a + b;
        out.data[i] = a * b - c * c - k * trace * trace;
    }
    out
}

/// Local maxima above `threshold`, at least `margin` pixels from every
/// border, strongest first with `(y, x)` breaking ties, capped at `max`.
pub(crate) fn select_keypoints(
    response: &LumaImage,
    threshold: f32,
    nms_radius: usize,
    margin: usize,
    max: usize,
) -> Vec<Keypoint> {
    let (w, h) = (response.w, response.h);
    if w <= 2 * margin || h <= 2 * margin {
        return Vec::new();
    }
    let r = nms_radius as isize;
    let mut kept = Vec::new();
    for y in margin..h - margin {
        for x in margin..w - margin {
            let v = response.get(x, y);
            if !(v > threshold) {
                continue;
            }
            let mut is_max = true;
            'window: for dy in -r..=r {
                for dx in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    let q = response.get(nx as usize, ny as usize);
                    let earlier = dy < 0 || (dy == 0 && dx < 0);
                    if q > v || (earlier && q == v) {
                        is_max = false;
                        break 'window;
                    }
                }
            }
            if is_max {
                kept.push(Keypoint { x, y, response: v });
            }
        }
    }
    kept.sort_by(|a, b| {
        b.response
            .total_cmp(&a.response)
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });
    kept.truncate(max);
    kept
}
