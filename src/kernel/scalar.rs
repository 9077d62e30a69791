//! Scalar reference kernels.

use crate::kernel::{CombineInputs, FieldKernel};
use crate::util::math::reflect_101;

/// Plain-loop implementation of the field primitives.
pub struct ScalarKernel;

/// Source row index for tap `t` of output row `y`.
#[inline]
pub(crate) fn tap_row(y: usize, t: usize, radius: usize, height: usize) -> usize {
    reflect_101(y as isize + t as isize - radius as isize, height)
}

/// SSIM for one pixel from its local statistics.
#[inline]
#[allow(clippy::too_many_arguments)]
pub(crate) fn ssim_pixel(
    mu_x: f32,
    mu_y: f32,
    mu_xy: f32,
    sigma_x_sq: f32,
    sigma_y_sq: f32,
    sigma_xy: f32,
    c1: f32,
    c2: f32,
) -> f32 {
    let numerator = (2.0 * mu_xy + c1) * (2.0 * sigma_xy + c2);
    let denominator = (mu_x * mu_x + mu_y * mu_y + c1) * (sigma_x_sq + sigma_y_sq + c2);
    numerator / denominator
}

impl FieldKernel for ScalarKernel {
    fn horizontal_row(padded: &[f32], weights: &[f32], out: &mut [f32]) {
        for (x, o) in out.iter_mut().enumerate() {
            let window = &padded[x..x + weights.len()];
            let mut acc = 0.0f32;
            for (&w, &v) in weights.iter().zip(window) {
                acc += w * v;
            }
            *o = acc;
        }
    }

    fn vertical_row(
        src: &[f32],
        width: usize,
        height: usize,
        y: usize,
        weights: &[f32],
        out: &mut [f32],
    ) {
        let radius = weights.len() / 2;
        out.fill(0.0);
        for (t, &w) in weights.iter().enumerate() {
            let start = tap_row(y, t, radius, height) * width;
            let row = &src[start..start + width];
            for (o, &v) in out.iter_mut().zip(row) {
                *o += w * v;
            }
        }
    }

    fn multiply(a: &[f32], b: &[f32], out: &mut [f32]) {
        for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
            *o = x * y;
        }
    }

    fn subtract_product(dst: &mut [f32], a: &[f32], b: &[f32]) {
        for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
            *d -= x * y;
        }
    }

    fn subtract(dst: &mut [f32], b: &[f32]) {
        for (d, &v) in dst.iter_mut().zip(b) {
            *d -= v;
        }
    }

    fn combine(stats: CombineInputs<'_>, c1: f32, c2: f32, out: &mut [f32]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = ssim_pixel(
                stats.mu_x[i],
                stats.mu_y[i],
                stats.mu_xy[i],
                stats.sigma_x_sq[i],
                stats.sigma_y_sq[i],
                stats.sigma_xy[i],
                c1,
                c2,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ssim_pixel, ScalarKernel};
    use crate::kernel::{CombineInputs, FieldKernel};

    #[test]
    fn identical_statistics_give_exactly_one() {
        let v = ssim_pixel(97.3, 97.3, 97.3 * 97.3, 12.5, 12.5, 12.5, 6.5536, 58.9824);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn anticorrelated_structure_is_negative() {
        let v = ssim_pixel(100.0, 100.0, 10_000.0, 400.0, 400.0, -400.0, 6.5536, 58.9824);
        assert!(v < -0.7);
    }

    #[test]
    fn combine_matches_pixel_formula() {
        let mu_x = [10.0f32, 200.0];
        let mu_y = [12.0f32, 180.0];
        let mu_xy = [120.0f32, 36_000.0];
        let sx = [4.0f32, 30.0];
        let sy = [5.0f32, 10.0];
        let sxy = [1.0f32, -3.0];
        let mut out = [0.0f32; 2];
        ScalarKernel::combine(
            CombineInputs {
                mu_x: &mu_x,
                mu_y: &mu_y,
                mu_xy: &mu_xy,
                sigma_x_sq: &sx,
                sigma_y_sq: &sy,
                sigma_xy: &sxy,
            },
            6.5,
            58.5,
            &mut out,
        );
        for i in 0..2 {
            let expected = ((2.0 * mu_xy[i] + 6.5) * (2.0 * sxy[i] + 58.5))
                / ((mu_x[i] * mu_x[i] + mu_y[i] * mu_y[i] + 6.5) * (sx[i] + sy[i] + 58.5));
            assert!((out[i] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn vertical_row_reflects_at_top() {
        // 1x3 column [1, 2, 3] with a 3-tap box.
        let src = [1.0f32, 2.0, 3.0];
        let weights = [1.0f32, 1.0, 1.0];
        let mut out = [0.0f32];
        ScalarKernel::vertical_row(&src, 1, 3, 0, &weights, &mut out);
        assert_eq!(out[0], 2.0 + 1.0 + 2.0);
    }
}
