//! Oriented, normalised intensity patches.

use crate::image::LumaImage;

/// Intensity-centroid orientation over a disc of `radius` pixels.
pub(crate) fn orientation(img: &LumaImage, x: usize, y: usize, radius: usize) -> f32 {
    let r = radius as isize;
    let mut m10 = 0.0f32;
    let mut m01 = 0.0f32;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let v = img.get_clamped(x as isize + dx, y as isize + dy);
            m10 += v * dx as f32;
            m01 += v * dy as f32;
        }
    }
    if m10 == 0.0 && m01 == 0.0 {
        0.0
    } else {
        m01.atan2(m10)
    }
}

/// Sample a `grid × grid` lattice rotated by `angle` around `(cx, cy)`,
/// subtract the mean and scale to unit length.
///
/// `None` for flat patches, which carry no usable signature.
pub(crate) fn describe(
    img: &LumaImage,
    cx: f32,
    cy: f32,
    angle: f32,
    grid: usize,
    step: f32,
) -> Option<Vec<f32>> {
    let (sin, cos) = angle.sin_cos();
    let half = 0.5 * (grid as f32 - 1.0);
    let mut samples = Vec::with_capacity(grid * grid);
    for j in 0..grid {
        let v = (j as f32 - half) * step;
        for i in 0..grid {
            let u = (i as f32 - half) * step;
            let dx = cos * u - sin * v;
            let dy = sin * u + cos * v;
            samples.push(img.sample_bilinear(cx + dx, cy + dy));
        }
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    for s in samples.iter_mut() {
        *s -= mean;
    }
    let norm = samples.iter().map(|s| s * s).sum::<f32>().sqrt();
    if norm < 1e-6 {
        return None;
    }
    for s in samples.iter_mut() {
        *s /= norm;
    }
    Some(samples)
}

/// Euclidean distance; for unit descriptors the range is `[0, 2]`.
#[inline]
pub fn descriptor_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
