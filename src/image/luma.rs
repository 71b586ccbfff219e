//! Owned single-channel f32 image in row-major layout.
//!
//! Working representation for the detector and the feature extractor. Values
//! are expected in `[0, 1]`. Border reads clamp to the nearest valid pixel.

use super::traits::{ImageView, ImageViewMut};

#[derive(Clone, Debug, PartialEq)]
pub struct LumaImage {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage, `w * h` values
    pub data: Vec<f32>,
}

impl LumaImage {
    /// Zero-initialized `w × h` buffer.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Build from raw values; `data.len()` must equal `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == w * h).then_some(Self { w, h, data })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Read with replicate-border semantics.
    #[inline]
    pub fn get_clamped(&self, x: isize, y: isize) -> f32 {
        let cx = x.clamp(0, self.w as isize - 1) as usize;
        let cy = y.clamp(0, self.h as isize - 1) as usize;
        self.get(cx, cy)
    }

    /// Bilinear interpolation at a continuous pixel coordinate (pixel centres
    /// sit on integers). Coordinates outside the image clamp to the border.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        if self.w == 0 || self.h == 0 {
            return 0.0;
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (ix, iy) = (x0 as isize, y0 as isize);
        let top = self.get_clamped(ix, iy) * (1.0 - fx) + self.get_clamped(ix + 1, iy) * fx;
        let bottom =
            self.get_clamped(ix, iy + 1) * (1.0 - fx) + self.get_clamped(ix + 1, iy + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

impl ImageView for LumaImage {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for LumaImage {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_hits_pixel_values_on_integers() {
        let img = LumaImage::from_vec(2, 2, vec![0.0, 1.0, 0.5, 0.25]).unwrap();
        assert_eq!(img.sample_bilinear(1.0, 0.0), 1.0);
        assert_eq!(img.sample_bilinear(0.0, 1.0), 0.5);
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = LumaImage::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
        assert!((img.sample_bilinear(0.25, 0.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn clamped_reads_replicate_border() {
        let img = LumaImage::from_vec(2, 1, vec![0.2, 0.8]).unwrap();
        assert_eq!(img.get_clamped(-3, 0), 0.2);
        assert_eq!(img.get_clamped(5, 4), 0.8);
    }
}
