//! Low-level building blocks for custom SSIM pipelines.
//!
//! These expose the Gaussian window, the local statistics buffers and the
//! field kernels behind the [`Ssim`](crate::Ssim) engine. Most users should
//! prefer the engine.

pub use crate::kernel::scalar::ScalarKernel;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdKernel;
pub use crate::kernel::{
    gaussian_blur, ssim_combine, BlurScratch, CombineInputs, FieldKernel, GaussianKernel,
};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::{gaussian_blur_par, ssim_combine_par};
pub use crate::stats::LocalStats;
