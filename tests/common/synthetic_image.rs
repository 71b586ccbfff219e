use piece_locator::geometry::{Point2D, Quadrilateral};
use piece_locator::image::{PixelFormat, RasterImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform RGB image.
pub fn flat_rgb(width: usize, height: usize, value: [u8; 3]) -> RasterImage {
    let mut data = Vec::with_capacity(width * height * 3);
    for _ in 0..width * height {
        data.extend_from_slice(&value);
    }
    RasterImage::new(width, height, PixelFormat::Rgb8, data).unwrap()
}

/// RGB texture of `block × block` cells with seeded random colours.
pub fn block_texture(width: usize, height: usize, block: usize, seed: u64) -> RasterImage {
    assert!(block > 0, "block size must be positive");
    let mut rng = StdRng::seed_from_u64(seed);
    let (bw, bh) = (width.div_ceil(block), height.div_ceil(block));
    let colours: Vec<[u8; 3]> = (0..bw * bh)
        .map(|_| [rng.gen_range(0..=255), rng.gen_range(0..=255), rng.gen_range(0..=255)])
        .collect();
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&colours[(y / block) * bw + x / block]);
        }
    }
    RasterImage::new(width, height, PixelFormat::Rgb8, data).unwrap()
}

/// Copy of `dst` with `src` pasted at `(x, y)`. Both must share a format
/// and `src` must fit.
pub fn paste(dst: &RasterImage, src: &RasterImage, x: usize, y: usize) -> RasterImage {
    assert_eq!(dst.format(), src.format());
    assert!(x + src.width() <= dst.width() && y + src.height() <= dst.height());
    let c = dst.channels();
    let mut data = dst.data().to_vec();
    for row in 0..src.height() {
        let start = ((y + row) * dst.width() + x) * c;
        data[start..start + src.width() * c].copy_from_slice(src.row(row));
    }
    RasterImage::new(dst.width(), dst.height(), dst.format(), data).unwrap()
}

/// Reference picture: flat grey with a textured `patch_size` square at
/// `(x, y)`.
pub fn puzzle_with_patch(
    size: usize,
    patch_size: usize,
    x: usize,
    y: usize,
    seed: u64,
) -> RasterImage {
    let background = flat_rgb(size, size, [128, 128, 128]);
    let patch = block_texture(patch_size, patch_size, 5, seed);
    paste(&background, &patch, x, y)
}

/// Grayscale photo of a bright quadrilateral on a dark background; pixels
/// whose centre lies inside `quad` are foreground.
pub fn quad_scene(width: usize, height: usize, quad: &Quadrilateral, fg: u8, bg: u8) -> RasterImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let inside = quad.contains(Point2D::new(x as f64 + 0.5, y as f64 + 0.5));
            data.push(if inside { fg } else { bg });
        }
    }
    RasterImage::gray(width, height, data).unwrap()
}

/// `img` turned a quarter turn clockwise.
pub fn rotate90(img: &RasterImage) -> RasterImage {
    let (w, h) = (img.width(), img.height());
    let mut data = Vec::with_capacity(img.data().len());
    for y in 0..w {
        for x in 0..h {
            data.extend_from_slice(img.pixel(y, h - 1 - x));
        }
    }
    RasterImage::new(h, w, img.format(), data).unwrap()
}

/// Every channel mapped through `v * gain + offset`, rounded and clamped.
pub fn relight(img: &RasterImage, gain: f32, offset: f32) -> RasterImage {
    let data = img
        .data()
        .iter()
        .map(|&v| (v as f32 * gain + offset).round().clamp(0.0, 255.0) as u8)
        .collect();
    RasterImage::new(img.width(), img.height(), img.format(), data).unwrap()
}
