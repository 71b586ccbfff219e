//! Raster buffers consumed and produced by the engine.
//!
//! - [`RasterImage`]: caller-facing, owned, interleaved 8-bit pixels.
//! - [`LumaImage`]: internal single-channel `f32` buffer in `[0, 1]`.
//! - [`io`]: file decoding/encoding helpers used by the demo binaries.

pub mod io;
pub mod luma;
pub mod raster;
pub mod traits;

pub use self::luma::LumaImage;
pub use self::raster::{PixelFormat, RasterImage};
pub use self::traits::{ImageView, ImageViewMut};
