//! Gaussian-weighted local statistics for one channel pair.
//!
//! For planes X and Y this computes, at full resolution:
//! `mu_x = G*X`, `mu_y = G*Y`, `mu_xy = mu_x * mu_y`,
//! `sigma_x_sq = G*(X*X) - mu_x^2`, `sigma_y_sq = G*(Y*Y) - mu_y^2` and
//! `sigma_xy = G*(X*Y) - mu_xy`, where `G*` is the separable Gaussian blur
//! with reflect-101 borders. No intermediate value is clamped, so tiny
//! negative variances from rounding are kept as is.
//!
//! Images smaller than the window are handled by the same border rule; their
//! statistics are dominated by reflected samples.

use crate::kernel::{BlurScratch, CombineInputs, Exec, GaussianKernel};
use crate::util::{SsimError, SsimResult};

/// Reusable buffers holding the local statistics of the last channel pair.
#[derive(Clone, Debug, Default)]
pub struct LocalStats {
    width: usize,
    height: usize,
    mu_x: Vec<f32>,
    mu_y: Vec<f32>,
    mu_xy: Vec<f32>,
    sigma_x_sq: Vec<f32>,
    sigma_y_sq: Vec<f32>,
    sigma_xy: Vec<f32>,
    product: Vec<f32>,
    scratch: BlurScratch,
}

impl LocalStats {
    /// Creates empty buffers; they grow to `width * height` on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the statistics of `x` and `y` sequentially.
    pub fn compute(
        &mut self,
        x: &[f32],
        y: &[f32],
        width: usize,
        height: usize,
        kernel: &GaussianKernel,
    ) -> SsimResult<()> {
        self.compute_with(Exec::Sequential, x, y, width, height, kernel)
    }

    pub(crate) fn compute_with(
        &mut self,
        exec: Exec,
        x: &[f32],
        y: &[f32],
        width: usize,
        height: usize,
        kernel: &GaussianKernel,
    ) -> SsimResult<()> {
        if width == 0 || height == 0 {
            return Err(SsimError::InvalidDimensions { width, height });
        }
        let len = width
            .checked_mul(height)
            .ok_or(SsimError::InvalidDimensions { width, height })?;
        for plane in [x, y] {
            if plane.len() != len {
                return Err(SsimError::BufferTooSmall {
                    needed: len,
                    got: plane.len(),
                });
            }
        }
        self.resize(width, height);

        exec.blur(x, &mut self.mu_x, width, height, kernel, &mut self.scratch)?;
        exec.blur(y, &mut self.mu_y, width, height, kernel, &mut self.scratch)?;
        exec.multiply(&self.mu_x, &self.mu_y, &mut self.mu_xy, width);

        exec.multiply(x, x, &mut self.product, width);
        exec.blur(&self.product, &mut self.sigma_x_sq, width, height, kernel, &mut self.scratch)?;
        exec.subtract_product(&mut self.sigma_x_sq, &self.mu_x, &self.mu_x, width);

        exec.multiply(y, y, &mut self.product, width);
        exec.blur(&self.product, &mut self.sigma_y_sq, width, height, kernel, &mut self.scratch)?;
        exec.subtract_product(&mut self.sigma_y_sq, &self.mu_y, &self.mu_y, width);

        exec.multiply(x, y, &mut self.product, width);
        exec.blur(&self.product, &mut self.sigma_xy, width, height, kernel, &mut self.scratch)?;
        exec.subtract(&mut self.sigma_xy, &self.mu_xy, width);

        Ok(())
    }

    fn resize(&mut self, width: usize, height: usize) {
        let len = width * height;
        for buf in [
            &mut self.mu_x,
            &mut self.mu_y,
            &mut self.mu_xy,
            &mut self.sigma_x_sq,
            &mut self.sigma_y_sq,
            &mut self.sigma_xy,
            &mut self.product,
        ] {
            buf.resize(len, 0.0);
        }
        self.width = width;
        self.height = height;
    }

    /// Width of the last computed fields.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the last computed fields.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Local mean of X.
    pub fn mu_x(&self) -> &[f32] {
        &self.mu_x
    }

    /// Local mean of Y.
    pub fn mu_y(&self) -> &[f32] {
        &self.mu_y
    }

    /// Product of the local means.
    pub fn mu_xy(&self) -> &[f32] {
        &self.mu_xy
    }

    /// Local variance of X.
    pub fn sigma_x_sq(&self) -> &[f32] {
        &self.sigma_x_sq
    }

    /// Local variance of Y.
    pub fn sigma_y_sq(&self) -> &[f32] {
        &self.sigma_y_sq
    }

    /// Local covariance of X and Y.
    pub fn sigma_xy(&self) -> &[f32] {
        &self.sigma_xy
    }

    /// Borrows all fields as input to the SSIM formula.
    pub fn combine_inputs(&self) -> CombineInputs<'_> {
        CombineInputs {
            mu_x: &self.mu_x,
            mu_y: &self.mu_y,
            mu_xy: &self.mu_xy,
            sigma_x_sq: &self.sigma_x_sq,
            sigma_y_sq: &self.sigma_y_sq,
            sigma_xy: &self.sigma_xy,
        }
    }
}
