//! 3×3 Sobel derivatives with border clamping.
//!
//! Outputs per-pixel `gx` and `gy`; magnitudes and angles are left to the
//! callers, which only need tensor products.
use crate::image::{ImageView, LumaImage};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

#[derive(Clone, Debug)]
pub struct Gradients {
    /// Horizontal derivative
    pub gx: LumaImage,
    /// Vertical derivative
    pub gy: LumaImage,
}

pub fn sobel_gradients(l: &LumaImage) -> Gradients {
    let (w, h) = (l.w, l.h);
    let mut gx = LumaImage::new(w, h);
    let mut gy = LumaImage::new(w, h);
    if w == 0 || h == 0 {
        return Gradients { gx, gy };
    }

    for y in 0..h {
        let rows = [
            l.row(y.saturating_sub(1)),
            l.row(y),
            l.row((y + 1).min(h - 1)),
        ];
        for x in 0..w {
            let xi = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, row) in rows.iter().enumerate() {
                for (kx, &sx) in xi.iter().enumerate() {
                    let v = row[sx];
                    sum_x += v * SOBEL_KERNEL_X[ky][kx];
                    sum_y += v * SOBEL_KERNEL_Y[ky][kx];
                }
            }
            gx.set(x, y, sum_x);
            gy.set(x, y, sum_y);
        }
    }

    Gradients { gx, gy }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_step_has_horizontal_gradient_only() {
        let mut img = LumaImage::new(6, 4);
        for y in 0..4 {
            for x in 3..6 {
                img.set(x, y, 1.0);
            }
        }
        let g = sobel_gradients(&img);
        assert_eq!(g.gx.get(2, 1), 4.0);
        assert_eq!(g.gx.get(3, 1), 4.0);
        assert_eq!(g.gx.get(0, 1), 0.0);
        assert!(g.gy.data.iter().all(|&v| v == 0.0));
    }
}
