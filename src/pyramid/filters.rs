use crate::image::{ImageView, ImageViewMut, LumaImage};

/// Trait implemented by separable 1D filters used for smoothing and pyramid
/// construction.
pub trait SeparableFilter: Send + Sync {
    /// Return the 1D taps (in left-to-right order). Taps are centred on the
    /// middle element; even-length kernels are not supported.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_5TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[0.0625, 0.25, 0.375, 0.25, 0.0625]);

/// Horizontal then vertical pass with replicate borders.
pub fn apply(filter: &dyn SeparableFilter, src: &LumaImage) -> LumaImage {
    let taps = filter.taps();
    let (w, h) = (src.w, src.h);
    if w == 0 || h == 0 || taps.is_empty() {
        return src.clone();
    }
    let r = (taps.len() / 2) as isize;

    let mut horiz = LumaImage::new(w, h);
    for y in 0..h {
        let row = src.row(y);
        let out = horiz.row_mut(y);
        for (x, dst) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &t) in taps.iter().enumerate() {
                let sx = (x as isize + k as isize - r).clamp(0, w as isize - 1) as usize;
                acc += t * row[sx];
            }
            *dst = acc;
        }
    }

    let mut out = LumaImage::new(w, h);
    for y in 0..h {
        let dst = out.row_mut(y);
        for (k, &t) in taps.iter().enumerate() {
            let sy = (y as isize + k as isize - r).clamp(0, h as isize - 1) as usize;
            for (d, &s) in dst.iter_mut().zip(horiz.row(sy)) {
                *d += t * s;
            }
        }
    }
    out
}
