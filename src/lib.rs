//! ssimkit computes the Structural Similarity Index (SSIM) between two
//! equally sized multi-channel images.
//!
//! Local means, variances and covariance come from a separable Gaussian
//! window (11x11, sigma 1.5 by default) with reflect-101 borders. The engine
//! produces one full-resolution similarity map per channel and reduces each
//! map to a mean score. Buffers live in the [`Ssim`] engine and are reused
//! across calls.
//!
//! Parallel execution is available via the `rayon` feature and `wide` SIMD
//! kernels via the `simd` feature. `image-io` adds loaders backed by the
//! `image` crate.
//!
//! ```
//! use ssimkit::{ImageView, Ssim};
//!
//! let a = vec![128u8; 16 * 16];
//! let b = vec![128u8; 16 * 16];
//! let mut ssim = Ssim::new(1)?;
//! let mean = ssim.compute_mean(
//!     ImageView::from_slice(&a, 16, 16, 1)?,
//!     ImageView::from_slice(&b, 16, 16, 1)?,
//! )?;
//! assert!((mean[0] - 1.0).abs() < 1e-6);
//! # Ok::<(), ssimkit::SsimError>(())
//! ```

mod combine;
mod engine;
pub mod image;
pub mod kernel;
pub mod lowlevel;
mod params;
mod stats;
mod trace;
pub mod util;

pub use combine::{MeanSimilarity, SimilarityMap};
pub use engine::{Ssim, Submission};
#[cfg(feature = "image-io")]
pub use crate::image::io;
pub use crate::image::{ImageView, OwnedImage, Sample, MAX_CHANNELS};
pub use kernel::GaussianKernel;
pub use params::{SsimConfig, SsimParams};
pub use stats::LocalStats;
pub use util::{SsimError, SsimResult};
