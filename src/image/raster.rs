//! Owned interleaved 8-bit raster handed in by the consuming application.

use super::luma::LumaImage;
use super::traits::ImageViewMut;
use crate::error::ExtractionError;
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};

/// Channel layout of a [`RasterImage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Immutable decoded image: `width × height` pixels, rows packed without padding.
///
/// The engine never mutates a caller-supplied raster; every transforming
/// operation returns a new buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap a pixel buffer, checking its length against the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ExtractionError> {
        let Some(expected) = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(format.channels()))
        else {
            return Err(ExtractionError::BufferSize {
                expected: usize::MAX,
                actual: data.len(),
            });
        };
        if data.len() != expected {
            return Err(ExtractionError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Convenience constructor for single-channel buffers.
    pub fn gray(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ExtractionError> {
        Self::new(width, height, PixelFormat::Gray8, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Fail with [`ExtractionError::EmptyImage`] when either side is zero.
    pub fn ensure_non_empty(&self) -> Result<(), ExtractionError> {
        if self.is_empty() {
            Err(ExtractionError::EmptyImage {
                width: self.width,
                height: self.height,
            })
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.channels();
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Channel values of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let c = self.channels();
        let start = (y * self.width + x) * c;
        &self.data[start..start + c]
    }

    /// Copy the intersection of the rectangle `(x, y, w, h)` with the image.
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> RasterImage {
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        let (cw, ch) = (x1 - x0, y1 - y0);
        let c = self.channels();
        let mut data = Vec::with_capacity(cw * ch * c);
        for row in y0..y1 {
            data.extend_from_slice(&self.row(row)[x0 * c..x1 * c]);
        }
        RasterImage {
            width: cw,
            height: ch,
            format: self.format,
            data,
        }
    }

    /// Largest centred square, the fallback reference region.
    pub fn center_square_crop(&self) -> RasterImage {
        let side = self.width.min(self.height);
        let x = (self.width - side) / 2;
        let y = (self.height - side) / 2;
        self.crop(x, y, side, side)
    }

    /// Rec.601 luma in `[0, 1]`; alpha is ignored.
    pub fn to_luma(&self) -> LumaImage {
        let mut out = LumaImage::new(self.width, self.height);
        let c = self.channels();
        for y in 0..self.height {
            let src = self.row(y);
            let dst = out.row_mut(y);
            for (x, px) in dst.iter_mut().enumerate() {
                let p = &src[x * c..x * c + c];
                *px = match self.format {
                    PixelFormat::Gray8 => p[0] as f32 / 255.0,
                    PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                        (0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32)
                            / 255.0
                    }
                };
            }
        }
        out
    }

    /// Identity of the pixel content, used to detect puzzle replacement.
    pub fn content_hash(&self) -> u64 {
        Fingerprint::new()
            .usize(self.width)
            .usize(self.height)
            .usize(self.format.channels())
            .bytes(&self.data)
            .finish()
    }
}
