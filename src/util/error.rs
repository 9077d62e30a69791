//! Error types for ssimkit.

use thiserror::Error;

/// Result alias for ssimkit operations.
pub type SsimResult<T> = std::result::Result<T, SsimError>;

/// Errors that can occur when configuring or running the SSIM engine.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SsimError {
    /// Construction parameters are out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// An image has a different channel count than the engine or its pair.
    #[error("channel count mismatch: expected {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },
    /// The two images differ in width or height.
    #[error("image dimensions differ: {}x{} vs {}x{}", a.0, a.1, b.0, b.1)]
    DimensionMismatch {
        a: (usize, usize),
        b: (usize, usize),
    },
    /// Width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Channel count is zero or above the supported maximum.
    #[error("invalid channel count: {channels}")]
    InvalidChannels { channels: usize },
    /// Row stride is shorter than one row of samples.
    #[error("invalid stride {stride} for row of {row_len} samples")]
    InvalidStride { row_len: usize, stride: usize },
    /// Backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A result accessor ran before a computation finished.
    #[error("no valid result: compute or synchronize first")]
    StaleResult,
    /// A submission is still in flight on this engine.
    #[error("engine busy: synchronize the pending submission first")]
    Busy,
    /// The submission handle was issued by another engine or is outdated.
    #[error("submission does not belong to this engine")]
    ForeignSubmission,
    /// The background worker could not be started or panicked.
    #[error("background worker failed")]
    WorkerFailed,
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}

impl SsimError {
    /// Returns true when the error describes an incompatible image pair
    /// rather than a misuse of the engine.
    pub fn is_incompatible_input(&self) -> bool {
        matches!(
            self,
            SsimError::ChannelMismatch { .. }
                | SsimError::DimensionMismatch { .. }
                | SsimError::InvalidDimensions { .. }
                | SsimError::InvalidChannels { .. }
                | SsimError::InvalidStride { .. }
                | SsimError::BufferTooSmall { .. }
        )
    }
}
