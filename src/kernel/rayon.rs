//! Rayon-parallel field drivers (feature-gated).
//!
//! Each pass is split into image rows and the rows are processed on the
//! rayon pool with the same row primitives as the sequential drivers, so
//! per-pixel results are identical.

use crate::kernel::{pad_row, BlurScratch, CombineInputs, FieldKernel, GaussianKernel};
use crate::util::{SsimError, SsimResult};
use rayon::prelude::*;

fn check_lengths(len: usize, width: usize, height: usize) -> SsimResult<()> {
    if width == 0 || height == 0 {
        return Err(SsimError::InvalidDimensions { width, height });
    }
    let needed = width
        .checked_mul(height)
        .ok_or(SsimError::InvalidDimensions { width, height })?;
    if len != needed {
        return Err(SsimError::BufferTooSmall { needed, got: len });
    }
    Ok(())
}

/// Row-parallel separable Gaussian blur.
///
/// The horizontal pass keeps one padded row buffer per worker; the vertical
/// pass reads the shared intermediate field.
pub fn gaussian_blur_par<K: FieldKernel>(
    src: &[f32],
    dst: &mut [f32],
    width: usize,
    height: usize,
    kernel: &GaussianKernel,
    scratch: &mut BlurScratch,
) -> SsimResult<()> {
    check_lengths(src.len(), width, height)?;
    check_lengths(dst.len(), width, height)?;

    let weights = kernel.weights();
    let radius = kernel.radius();
    scratch.rows.resize(width * height, 0.0);

    scratch
        .rows
        .par_chunks_exact_mut(width)
        .zip(src.par_chunks_exact(width))
        .for_each_init(
            || Vec::with_capacity(width + 2 * radius),
            |padded, (tmp_row, src_row)| {
                pad_row(src_row, radius, padded);
                K::horizontal_row(padded.as_slice(), weights, tmp_row);
            },
        );

    let rows = &scratch.rows;
    dst.par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| K::vertical_row(rows, width, height, y, weights, out_row));
    Ok(())
}

/// Row-parallel `out = a * b`.
pub(crate) fn multiply_par<K: FieldKernel>(a: &[f32], b: &[f32], out: &mut [f32], width: usize) {
    out.par_chunks_mut(width)
        .zip(a.par_chunks(width))
        .zip(b.par_chunks(width))
        .for_each(|((o, a), b)| K::multiply(a, b, o));
}

/// Row-parallel `dst -= a * b`.
pub(crate) fn subtract_product_par<K: FieldKernel>(dst: &mut [f32], a: &[f32], b: &[f32], width: usize) {
    dst.par_chunks_mut(width)
        .zip(a.par_chunks(width))
        .zip(b.par_chunks(width))
        .for_each(|((d, a), b)| K::subtract_product(d, a, b));
}

/// Row-parallel `dst -= b`.
pub(crate) fn subtract_par<K: FieldKernel>(dst: &mut [f32], b: &[f32], width: usize) {
    dst.par_chunks_mut(width)
        .zip(b.par_chunks(width))
        .for_each(|(d, b)| K::subtract(d, b));
}

/// Row-parallel SSIM formula.
pub fn ssim_combine_par<K: FieldKernel>(
    stats: CombineInputs<'_>,
    c1: f32,
    c2: f32,
    out: &mut [f32],
    width: usize,
) -> SsimResult<()> {
    if width == 0 {
        return Err(SsimError::InvalidDimensions {
            width,
            height: out.len(),
        });
    }
    if !stats.lengths_match(out.len()) {
        return Err(SsimError::BufferTooSmall {
            needed: out.len(),
            got: stats.len(),
        });
    }
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let start = y * width;
            let end = start + out_row.len();
            K::combine(stats.slice(start, end), c1, c2, out_row);
        });
    Ok(())
}

const MEAN_CHUNK: usize = 4096;

/// Parallel `f64` mean of a field.
///
/// Partial sums are taken over fixed chunks and folded in order, so the
/// result does not depend on how rayon schedules the work.
pub(crate) fn mean_f64_par(field: &[f32]) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let partials: Vec<f64> = field
        .par_chunks(MEAN_CHUNK)
        .map(|chunk| chunk.iter().map(|&v| f64::from(v)).sum::<f64>())
        .collect();
    partials.iter().sum::<f64>() / field.len() as f64
}
