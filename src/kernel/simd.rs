//! SIMD-accelerated field kernels using the `wide` crate.
//!
//! Pixels along a row are processed 8 at a time using `f32x8`. Each lane
//! performs the same operations in the same order as the scalar reference,
//! so results match it; the row tail falls back to scalar code.

use crate::kernel::scalar::{ssim_pixel, tap_row};
use crate::kernel::{CombineInputs, FieldKernel};
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

#[inline]
fn store_f32x8(v: f32x8, out: &mut [f32]) {
    out[..LANES].copy_from_slice(&v.to_array());
}

/// `wide::f32x8` implementation of the field primitives.
pub struct SimdKernel;

impl FieldKernel for SimdKernel {
    fn horizontal_row(padded: &[f32], weights: &[f32], out: &mut [f32]) {
        let width = out.len();
        let simd_end = width / LANES * LANES;

        let mut x = 0;
        while x < simd_end {
            let mut acc = f32x8::ZERO;
            for (t, &w) in weights.iter().enumerate() {
                acc += f32x8::splat(w) * load_f32x8(&padded[x + t..]);
            }
            store_f32x8(acc, &mut out[x..]);
            x += LANES;
        }

        // Scalar remainder
        while x < width {
            let mut acc = 0.0f32;
            for (t, &w) in weights.iter().enumerate() {
                acc += w * padded[x + t];
            }
            out[x] = acc;
            x += 1;
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
        let simd_end = width / LANES * LANES;

        let mut x = 0;
        while x < simd_end {
            let mut acc = f32x8::ZERO;
            for (t, &w) in weights.iter().enumerate() {
                let start = tap_row(y, t, radius, height) * width;
                acc += f32x8::splat(w) * load_f32x8(&src[start + x..]);
            }
            store_f32x8(acc, &mut out[x..]);
            x += LANES;
        }

        // Scalar remainder
        while x < width {
            let mut acc = 0.0f32;
            for (t, &w) in weights.iter().enumerate() {
                let start = tap_row(y, t, radius, height) * width;
                acc += w * src[start + x];
            }
            out[x] = acc;
            x += 1;
        }
    }

    fn multiply(a: &[f32], b: &[f32], out: &mut [f32]) {
        let len = out.len();
        let simd_end = len / LANES * LANES;
        let mut i = 0;
        while i < simd_end {
            store_f32x8(load_f32x8(&a[i..]) * load_f32x8(&b[i..]), &mut out[i..]);
            i += LANES;
        }
        for j in i..len {
            out[j] = a[j] * b[j];
        }
    }

    fn subtract_product(dst: &mut [f32], a: &[f32], b: &[f32]) {
        let len = dst.len();
        let simd_end = len / LANES * LANES;
        let mut i = 0;
        while i < simd_end {
            let v = load_f32x8(&dst[i..]) - load_f32x8(&a[i..]) * load_f32x8(&b[i..]);
            store_f32x8(v, &mut dst[i..]);
            i += LANES;
        }
        for j in i..len {
            dst[j] -= a[j] * b[j];
        }
    }

    fn subtract(dst: &mut [f32], b: &[f32]) {
        let len = dst.len();
        let simd_end = len / LANES * LANES;
        let mut i = 0;
        while i < simd_end {
            let v = load_f32x8(&dst[i..]) - load_f32x8(&b[i..]);
            store_f32x8(v, &mut dst[i..]);
            i += LANES;
        }
        for j in i..len {
            dst[j] -= b[j];
        }
    }

    fn combine(stats: CombineInputs<'_>, c1: f32, c2: f32, out: &mut [f32]) {
        let len = out.len();
        let simd_end = len / LANES * LANES;
        let two = f32x8::splat(2.0);
        let c1v = f32x8::splat(c1);
        let c2v = f32x8::splat(c2);

        let mut i = 0;
        while i < simd_end {
            let mu_x = load_f32x8(&stats.mu_x[i..]);
            let mu_y = load_f32x8(&stats.mu_y[i..]);
            let mu_xy = load_f32x8(&stats.mu_xy[i..]);
            let sx = load_f32x8(&stats.sigma_x_sq[i..]);
            let sy = load_f32x8(&stats.sigma_y_sq[i..]);
            let sxy = load_f32x8(&stats.sigma_xy[i..]);

            let numerator = (two * mu_xy + c1v) * (two * sxy + c2v);
            let denominator = (mu_x * mu_x + mu_y * mu_y + c1v) * (sx + sy + c2v);
            store_f32x8(numerator / denominator, &mut out[i..]);
            i += LANES;
        }

        // Scalar remainder
        for j in i..len {
            out[j] = ssim_pixel(
                stats.mu_x[j],
                stats.mu_y[j],
                stats.mu_xy[j],
                stats.sigma_x_sq[j],
                stats.sigma_y_sq[j],
                stats.sigma_xy[j],
                c1,
                c2,
            );
        }
    }
}
