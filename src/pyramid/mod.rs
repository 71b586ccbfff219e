//! Luma pyramid with separable blur and 2× decimation.
//!
//! Level 0 is the caller's image. Each further level blurs the previous one
//! with a separable filter (Gaussian by default) and keeps every second
//! sample, so a pixel `(x, y)` at level `k` covers
//! `[x·2^k, (x+1)·2^k) × [y·2^k, (y+1)·2^k)` at level 0.

pub mod filters;

use crate::image::LumaImage;
use filters::{apply as apply_filter, SeparableFilter, GAUSSIAN_5TAP};

#[derive(Clone, Debug, Default)]
pub struct Pyramid {
    pub levels: Vec<LumaImage>,
}

impl Pyramid {
    /// Build `levels` levels (at least one) from `base`.
    pub fn build(base: LumaImage, levels: usize, filter: &dyn SeparableFilter) -> Self {
        let levels_wanted = levels.max(1);
        let mut out = Vec::with_capacity(levels_wanted);
        out.push(base);
        while out.len() < levels_wanted {
            let Some(prev) = out.last() else { break };
            if prev.w <= 1 && prev.h <= 1 {
                break;
            }
            let next = downsample(prev, Some(filter));
            out.push(next);
        }
        Self { levels: out }
    }

    /// Add levels until the longer side of the coarsest one is at most
    /// `max_side` pixels.
    pub fn build_to_max_side(base: LumaImage, max_side: usize) -> Self {
        let mut levels = 1;
        let mut side = base.w.max(base.h);
        while side > max_side.max(1) {
            side = side.div_ceil(2);
            levels += 1;
        }
        Self::build(base, levels, &GAUSSIAN_5TAP)
    }

    pub fn coarsest(&self) -> Option<&LumaImage> {
        self.levels.last()
    }

    pub fn coarsest_index(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Factor from level `index` coordinates to level 0 coordinates.
    pub fn scale_to_base(index: usize) -> f64 {
        (1u64 << index.min(62)) as f64
    }
}

/// Halve both dimensions (rounding up), optionally smoothing first.
pub fn downsample(src: &LumaImage, filter: Option<&dyn SeparableFilter>) -> LumaImage {
    let filtered = filter.map(|f| apply_filter(f, src));
    let src_img = filtered.as_ref().unwrap_or(src);
    let (nw, nh) = (src.w.div_ceil(2), src.h.div_ceil(2));
    let mut down = LumaImage::new(nw, nh);
    if src.w == 0 || src.h == 0 {
        return down;
    }
    for y in 0..nh {
        let sy = (y * 2).min(src_img.h - 1);
        for x in 0..nw {
            let sx = (x * 2).min(src_img.w - 1);
            down.set(x, y, src_img.get(sx, sy));
        }
    }
    down
}
