//! SSIM parameter model.
//!
//! `SsimConfig` is the plain, user-editable configuration. `SsimParams` is
//! the validated, immutable form holding the derived stability constants and
//! the precomputed Gaussian window.

use crate::image::MAX_CHANNELS;
use crate::kernel::GaussianKernel;
use crate::util::{SsimError, SsimResult};

/// Configuration for an SSIM engine.
#[derive(Clone, Debug, PartialEq)]
pub struct SsimConfig {
    /// Luminance stability coefficient.
    pub k1: f64,
    /// Contrast stability coefficient.
    pub k2: f64,
    /// Sample bit depth used for the dynamic range `2^bit_depth`.
    pub bit_depth: u32,
    /// Side length of the square Gaussian window (odd).
    pub window_size: usize,
    /// Standard deviation of the Gaussian window.
    pub sigma: f64,
    /// Number of channels both images must carry.
    pub channels: usize,
    /// Run channels and rows in parallel (only with the `rayon` feature).
    pub parallel: bool,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            k1: 0.01,
            k2: 0.03,
            bit_depth: 8,
            window_size: 11,
            sigma: 1.5,
            channels: 1,
            parallel: true,
        }
    }
}

impl SsimConfig {
    /// Default parameters for an image with `channels` channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }
}

/// Validated SSIM parameters with derived constants.
#[derive(Clone, Debug)]
pub struct SsimParams {
    config: SsimConfig,
    c1: f32,
    c2: f32,
    kernel: GaussianKernel,
}

impl SsimParams {
    /// Validates `config` and precomputes C1, C2 and the Gaussian window.
    pub fn new(config: SsimConfig) -> SsimResult<Self> {
        if config.channels == 0 {
            return Err(SsimError::InvalidConfig {
                reason: "channel count must be at least 1",
            });
        }
        if config.channels > MAX_CHANNELS {
            return Err(SsimError::InvalidConfig {
                reason: "channel count must be at most 4",
            });
        }
        if config.bit_depth == 0 || config.bit_depth > 16 {
            return Err(SsimError::InvalidConfig {
                reason: "bit depth must be within 1..=16",
            });
        }
        if !(config.k1.is_finite() && config.k1 >= 0.0) {
            return Err(SsimError::InvalidConfig {
                reason: "k1 must be finite and non-negative",
            });
        }
        if !(config.k2.is_finite() && config.k2 >= 0.0) {
            return Err(SsimError::InvalidConfig {
                reason: "k2 must be finite and non-negative",
            });
        }
        let kernel = GaussianKernel::new(config.window_size, config.sigma)?;

        let range = f64::from(1u32 << config.bit_depth);
        let c1 = (config.k1 * range).powi(2) as f32;
        let c2 = (config.k2 * range).powi(2) as f32;

        Ok(Self {
            config,
            c1,
            c2,
            kernel,
        })
    }

    /// Luminance stability constant `(k1 * 2^bit_depth)^2`.
    pub fn c1(&self) -> f32 {
        self.c1
    }

    /// Contrast stability constant `(k2 * 2^bit_depth)^2`.
    pub fn c2(&self) -> f32 {
        self.c2
    }

    /// Gaussian window side length.
    pub fn window_size(&self) -> usize {
        self.config.window_size
    }

    /// Gaussian standard deviation.
    pub fn sigma(&self) -> f64 {
        self.config.sigma
    }

    /// Configured channel count.
    pub fn channels(&self) -> usize {
        self.config.channels
    }

    /// Configured bit depth.
    pub fn bit_depth(&self) -> u32 {
        self.config.bit_depth
    }

    /// Normalized separable Gaussian window.
    pub fn kernel(&self) -> &GaussianKernel {
        &self.kernel
    }

    /// The configuration these parameters were built from.
    pub fn config(&self) -> &SsimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::{SsimConfig, SsimParams};

    #[test]
    fn default_constants_use_power_of_two_range() {
        let params = SsimParams::new(SsimConfig::default()).unwrap();
        assert!((params.c1() - 6.5536).abs() < 1e-4);
        assert!((params.c2() - 58.9824).abs() < 1e-3);
    }

    #[test]
    fn sixteen_bit_scales_constants() {
        let params = SsimParams::new(SsimConfig {
            bit_depth: 16,
            ..SsimConfig::default()
        })
        .unwrap();
        let expected = (0.01f64 * 65536.0).powi(2) as f32;
        assert_eq!(params.c1(), expected);
    }
}
