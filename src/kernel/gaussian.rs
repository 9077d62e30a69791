//! Normalized separable Gaussian window.

use crate::util::{SsimError, SsimResult};

/// 1D normalized Gaussian taps; the 2D window is their outer product.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKernel {
    weights: Vec<f32>,
    sigma: f64,
}

impl GaussianKernel {
    /// Builds a window of `size` taps with standard deviation `sigma`.
    ///
    /// Tap `i` is `exp(-(i - r)^2 / (2 sigma^2))` with `r = (size - 1) / 2`,
    /// normalized so the taps sum to one.
    pub fn new(size: usize, sigma: f64) -> SsimResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(SsimError::InvalidConfig {
                reason: "window size must be odd and positive",
            });
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(SsimError::InvalidConfig {
                reason: "standard deviation must be finite and positive",
            });
        }

        let radius = (size / 2) as f64;
        let denom = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let d = i as f64 - radius;
                (-(d * d) / denom).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        let weights = raw.iter().map(|&w| (w / sum) as f32).collect();

        Ok(Self { weights, sigma })
    }

    /// Returns the 1D taps.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of taps per axis.
    pub fn size(&self) -> usize {
        self.weights.len()
    }

    /// Half-width of the window.
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    /// Standard deviation the taps were built from.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Weight of the 2D window at offset `(dx, dy)` from its center.
    pub fn weight_2d(&self, dx: isize, dy: isize) -> Option<f32> {
        let r = self.radius() as isize;
        let ix = usize::try_from(dx + r).ok()?;
        let iy = usize::try_from(dy + r).ok()?;
        Some(self.weights.get(ix)? * self.weights.get(iy)?)
    }
}
