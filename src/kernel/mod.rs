//! Field kernels: separable Gaussian convolution and elementwise passes.
//!
//! Kernels work on dense row-major `f32` fields. Row primitives are defined
//! by [`FieldKernel`] and implemented by the scalar reference and, with the
//! `simd` feature, a `wide::f32x8` backend. The drivers in this module run
//! them sequentially; `kernel::rayon` runs them row-parallel.
//!
//! Borders use reflect-101 (`dcb|abcdefgh|gfe`). Every backend performs the
//! same operations in the same order per pixel, with no fused multiply-add.

use crate::util::math::reflect_101;
use crate::util::{SsimError, SsimResult};

mod gaussian;
pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use gaussian::GaussianKernel;

// Row kernel used by the drivers - SIMD when available
#[cfg(not(feature = "simd"))]
pub(crate) use scalar::ScalarKernel as RowKernel;
#[cfg(feature = "simd")]
pub(crate) use simd::SimdKernel as RowKernel;

/// Per-pixel local statistics consumed by the SSIM formula.
#[derive(Clone, Copy, Debug)]
pub struct CombineInputs<'a> {
    /// Local mean of X.
    pub mu_x: &'a [f32],
    /// Local mean of Y.
    pub mu_y: &'a [f32],
    /// Product of the local means.
    pub mu_xy: &'a [f32],
    /// Local variance of X.
    pub sigma_x_sq: &'a [f32],
    /// Local variance of Y.
    pub sigma_y_sq: &'a [f32],
    /// Local covariance of X and Y.
    pub sigma_xy: &'a [f32],
}

impl CombineInputs<'_> {
    pub(crate) fn len(&self) -> usize {
        self.mu_x.len()
    }

    fn lengths_match(&self, len: usize) -> bool {
        [
            self.mu_x.len(),
            self.mu_y.len(),
            self.mu_xy.len(),
            self.sigma_x_sq.len(),
            self.sigma_y_sq.len(),
            self.sigma_xy.len(),
        ]
        .iter()
        .all(|&l| l == len)
    }

    /// Sub-slices every field to `start..end`.
    #[cfg(feature = "rayon")]
    pub(crate) fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            mu_x: &self.mu_x[start..end],
            mu_y: &self.mu_y[start..end],
            mu_xy: &self.mu_xy[start..end],
            sigma_x_sq: &self.sigma_x_sq[start..end],
            sigma_y_sq: &self.sigma_y_sq[start..end],
            sigma_xy: &self.sigma_xy[start..end],
        }
    }
}

/// Row-level numeric primitives shared by all execution strategies.
///
/// Slices passed to one call have equal lengths; drivers check this.
pub trait FieldKernel {
    /// Horizontal pass: `out[x] = sum_t w[t] * padded[x + t]`.
    ///
    /// `padded` holds the source row extended by `radius` reflected samples
    /// on each side.
    fn horizontal_row(padded: &[f32], weights: &[f32], out: &mut [f32]);

    /// Vertical pass for output row `y`:
    /// `out[x] = sum_t w[t] * src[reflect(y + t - r)][x]`.
    fn vertical_row(src: &[f32], width: usize, height: usize, y: usize, weights: &[f32], out: &mut [f32]);

    /// `out = a * b`.
    fn multiply(a: &[f32], b: &[f32], out: &mut [f32]);

    /// `dst -= a * b`.
    fn subtract_product(dst: &mut [f32], a: &[f32], b: &[f32]);

    /// `dst -= b`.
    fn subtract(dst: &mut [f32], b: &[f32]);

    /// SSIM formula for every pixel.
    fn combine(stats: CombineInputs<'_>, c1: f32, c2: f32, out: &mut [f32]);
}

/// Reusable scratch memory for the separable blur.
#[derive(Clone, Debug, Default)]
pub struct BlurScratch {
    pub(crate) rows: Vec<f32>,
    pub(crate) padded: Vec<f32>,
}

impl BlurScratch {
    /// Creates empty scratch buffers; they grow on first use.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fills `padded` with `row` extended by `radius` reflect-101 samples on
/// both sides.
pub(crate) fn pad_row(row: &[f32], radius: usize, padded: &mut Vec<f32>) {
    let len = row.len();
    padded.clear();
    padded.extend((0..len + 2 * radius).map(|i| row[reflect_101(i as isize - radius as isize, len)]));
}

fn check_field(len: usize, width: usize, height: usize) -> SsimResult<()> {
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

/// Sequential separable Gaussian blur of `src` into `dst` with kernel `K`.
pub fn gaussian_blur<K: FieldKernel>(
    src: &[f32],
    dst: &mut [f32],
    width: usize,
    height: usize,
    kernel: &GaussianKernel,
    scratch: &mut BlurScratch,
) -> SsimResult<()> {
    check_field(src.len(), width, height)?;
    check_field(dst.len(), width, height)?;

    let weights = kernel.weights();
    let radius = kernel.radius();
    scratch.rows.resize(width * height, 0.0);

    for (src_row, tmp_row) in src.chunks_exact(width).zip(scratch.rows.chunks_exact_mut(width)) {
        pad_row(src_row, radius, &mut scratch.padded);
        K::horizontal_row(&scratch.padded, weights, tmp_row);
    }
    for (y, out_row) in dst.chunks_exact_mut(width).enumerate() {
        K::vertical_row(&scratch.rows, width, height, y, weights, out_row);
    }
    Ok(())
}

/// Applies the SSIM formula over whole fields with kernel `K`.
pub fn ssim_combine<K: FieldKernel>(
    stats: CombineInputs<'_>,
    c1: f32,
    c2: f32,
    out: &mut [f32],
) -> SsimResult<()> {
    if !stats.lengths_match(out.len()) {
        return Err(SsimError::BufferTooSmall {
            needed: out.len(),
            got: stats.len(),
        });
    }
    K::combine(stats, c1, c2, out);
    Ok(())
}

/// Chooses between the sequential drivers and the row-parallel ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Exec {
    Sequential,
    #[cfg(feature = "rayon")]
    Parallel,
}

impl Exec {
    pub(crate) fn new(parallel: bool) -> Self {
        #[cfg(feature = "rayon")]
        {
            if parallel {
                return Exec::Parallel;
            }
        }
        #[cfg(not(feature = "rayon"))]
        let _ = parallel;
        Exec::Sequential
    }

    pub(crate) fn blur(
        self,
        src: &[f32],
        dst: &mut [f32],
        width: usize,
        height: usize,
        kernel: &GaussianKernel,
        scratch: &mut BlurScratch,
    ) -> SsimResult<()> {
        match self {
            Exec::Sequential => gaussian_blur::<RowKernel>(src, dst, width, height, kernel, scratch),
            #[cfg(feature = "rayon")]
            Exec::Parallel => {
                self::rayon::gaussian_blur_par::<RowKernel>(src, dst, width, height, kernel, scratch)
            }
        }
    }

    #[cfg_attr(not(feature = "rayon"), allow(unused_variables))]
    pub(crate) fn multiply(self, a: &[f32], b: &[f32], out: &mut [f32], width: usize) {
        match self {
            Exec::Sequential => RowKernel::multiply(a, b, out),
            #[cfg(feature = "rayon")]
            Exec::Parallel => self::rayon::multiply_par::<RowKernel>(a, b, out, width),
        }
    }

    #[cfg_attr(not(feature = "rayon"), allow(unused_variables))]
    pub(crate) fn subtract_product(self, dst: &mut [f32], a: &[f32], b: &[f32], width: usize) {
        match self {
            Exec::Sequential => RowKernel::subtract_product(dst, a, b),
            #[cfg(feature = "rayon")]
            Exec::Parallel => self::rayon::subtract_product_par::<RowKernel>(dst, a, b, width),
        }
    }

    #[cfg_attr(not(feature = "rayon"), allow(unused_variables))]
    pub(crate) fn subtract(self, dst: &mut [f32], b: &[f32], width: usize) {
        match self {
            Exec::Sequential => RowKernel::subtract(dst, b),
            #[cfg(feature = "rayon")]
            Exec::Parallel => self::rayon::subtract_par::<RowKernel>(dst, b, width),
        }
    }

    #[cfg_attr(not(feature = "rayon"), allow(unused_variables))]
    pub(crate) fn combine(
        self,
        stats: CombineInputs<'_>,
        c1: f32,
        c2: f32,
        out: &mut [f32],
        width: usize,
    ) -> SsimResult<()> {
        match self {
            Exec::Sequential => ssim_combine::<RowKernel>(stats, c1, c2, out),
            #[cfg(feature = "rayon")]
            Exec::Parallel => self::rayon::ssim_combine_par::<RowKernel>(stats, c1, c2, out, width),
        }
    }
}
