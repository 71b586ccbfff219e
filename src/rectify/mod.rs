//! Perspective rectification of a detected quadrilateral into an upright
//! raster.
//!
//! The output rectangle `[0, W] × [0, H]` is tied to the quad by a full
//! 8-DOF homography solved from the four corner pairs. Every output pixel
//! centre is mapped back into the source and sampled bilinearly per channel;
//! samples that land outside the source take the background value.

use crate::error::{ensure, ConfigurationError, GeometryError, Result};
use crate::geometry::{Homography, Point2D, Quadrilateral};
use crate::image::RasterImage;
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyOptions {
    /// Uniformly shrink the output so its longer side is at most this.
    /// `None` keeps the measured size.
    pub max_output_side: Option<usize>,
    /// Value written to every channel of samples outside the source.
    pub background: u8,
}

impl Default for RectifyOptions {
    fn default() -> Self {
        Self {
            max_output_side: None,
            background: 0,
        }
    }
}

impl RectifyOptions {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if let Some(side) = self.max_output_side {
            ensure(side >= 1, "rectify.max_output_side", side as f64, ">= 1")?;
        }
        Ok(())
    }
}

/// `(max(top, bottom), max(left, right))`, rounded to whole pixels.
pub fn output_size(quad: &Quadrilateral) -> std::result::Result<(usize, usize), GeometryError> {
    quad.validate()?;
    let w = quad.top_length().max(quad.bottom_length()).round();
    let h = quad.left_length().max(quad.right_length()).round();
    if !(w >= 1.0 && h >= 1.0) {
        return Err(GeometryError::DegenerateQuad);
    }
    Ok((w as usize, h as usize))
}

fn sample_bilinear(img: &RasterImage, x: f64, y: f64, out: &mut [u8]) {
    let (w, h) = (img.width() as isize, img.height() as isize);
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let cx = |v: isize| v.clamp(0, w - 1) as usize;
    let cy = |v: isize| v.clamp(0, h - 1) as usize;
    let (ix, iy) = (x0 as isize, y0 as isize);
    let p00 = img.pixel(cx(ix), cy(iy));
    let p10 = img.pixel(cx(ix + 1), cy(iy));
    let p01 = img.pixel(cx(ix), cy(iy + 1));
    let p11 = img.pixel(cx(ix + 1), cy(iy + 1));
    for (c, dst) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        *dst = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
}

/// Unwarp `quad` (source pixel coordinates) into an upright raster of
/// [`output_size`] (possibly shrunk by `max_output_side`).
pub fn rectify(image: &RasterImage, quad: &Quadrilateral, options: &RectifyOptions) -> Result<RasterImage> {
    image.ensure_non_empty()?;
    let (mut out_w, mut out_h) = output_size(quad)?;
    if let Some(limit) = options.max_output_side {
        let longest = out_w.max(out_h);
        if longest > limit {
            let s = limit as f64 / longest as f64;
            out_w = ((out_w as f64 * s).round() as usize).max(1);
            out_h = ((out_h as f64 * s).round() as usize).max(1);
        }
    }

    let (fw, fh) = (out_w as f64, out_h as f64);
    let rect = [
        Point2D::new(0.0, 0.0),
        Point2D::new(fw, 0.0),
        Point2D::new(0.0, fh),
        Point2D::new(fw, fh),
    ];
    let to_source = Homography::from_point_pairs(&rect, &quad.corners())?;

    let channels = image.channels();
    let stride = out_w * channels;
    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let fill_row = |y: usize, row: &mut [u8]| {
        for x in 0..out_w {
            let px = &mut row[x * channels..(x + 1) * channels];
            let centre = Point2D::new(x as f64 + 0.5, y as f64 + 0.5);
            match to_source.map_point(centre) {
                Some(p) if p.x >= 0.0 && p.y >= 0.0 && p.x <= src_w && p.y <= src_h => {
                    sample_bilinear(image, p.x - 0.5, p.y - 0.5, px)
                }
                _ => px.fill(options.background),
            }
        }
    };

    let mut data = vec![options.background; stride * out_h];
    #[cfg(feature = "parallel")]
    data.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| fill_row(y, row));
    #[cfg(not(feature = "parallel"))]
    data.chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| fill_row(y, row));

    debug!(
        "rectify {}x{} -> {}x{}",
        image.width(),
        image.height(),
        out_w,
        out_h
    );
    Ok(RasterImage::new(out_w, out_h, image.format(), data)?)
}
