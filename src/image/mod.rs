//! Interleaved multi-channel image views and owned buffers.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer of channel-interleaved
//! samples (`RGBRGB...`) with an explicit stride. The stride counts elements
//! between the starts of consecutive rows, so a stride larger than
//! `width * channels` represents padded rows.

use crate::util::{SsimError, SsimResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Largest channel count an image or engine may carry.
pub const MAX_CHANNELS: usize = 4;

/// A numeric sample type that can be ingested into the `f32` pipeline.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Widest bit depth the type can represent.
    const BITS: u32;

    /// Converts the sample to `f32` without rescaling.
    fn to_f32(self) -> f32;
}

impl Sample for u8 {
    const BITS: u32 = 8;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for u16 {
    const BITS: u32 = 16;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for f32 {
    const BITS: u32 = 32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}

/// Borrowed interleaved image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width * channels`.
    pub fn from_slice(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
    ) -> SsimResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(SsimError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, channels, stride)
    }

    /// Creates a view with an explicit stride in elements.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> SsimResult<Self> {
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(SsimError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the sample of channel `c` at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height || c >= self.channels {
            return None;
        }
        let idx = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?
            .checked_add(c)?;
        self.data.get(idx)
    }

    /// Returns the interleaved samples of row `y` (`width * channels` long).
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }
}

impl<T: Sample> ImageView<'_, T> {
    /// Copies channel `c` into a row-major `f32` plane, reusing `dst`'s
    /// allocation.
    pub(crate) fn extract_channel(&self, c: usize, dst: &mut Vec<f32>) {
        dst.clear();
        dst.reserve(self.width * self.height);
        for y in 0..self.height {
            let start = y * self.stride;
            let row = &self.data[start..start + self.width * self.channels];
            dst.extend(
                row.iter()
                    .skip(c)
                    .step_by(self.channels)
                    .map(|&v| v.to_f32()),
            );
        }
    }
}

/// Owned contiguous interleaved image buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    channels: usize,
}

impl<T> OwnedImage<T> {
    /// Creates an owned image from a contiguous interleaved buffer.
    ///
    /// The buffer length must be exactly `width * height * channels`.
    pub fn new(data: Vec<T>, width: usize, height: usize, channels: usize) -> SsimResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(SsimError::InvalidDimensions { width, height })?;
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(SsimError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(SsimError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the contiguous interleaved samples.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable slice over the samples.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

fn required_len(
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
) -> SsimResult<usize> {
    if width == 0 || height == 0 {
        return Err(SsimError::InvalidDimensions { width, height });
    }
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(SsimError::InvalidChannels { channels });
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or(SsimError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(SsimError::InvalidStride { row_len, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(SsimError::InvalidDimensions { width, height })?;
    Ok(needed)
}

#[cfg(test)]
mod tests {
    use super::{ImageView, OwnedImage};
    use crate::util::SsimError;

    #[test]
    fn extract_channel_skips_padding() {
        // 2x2 RGB with one padding sample per row.
        let data = [1u8, 2, 3, 4, 5, 6, 99, 7, 8, 9, 10, 11, 12, 99];
        let view = ImageView::new(&data, 2, 2, 3, 7).unwrap();
        let mut plane = Vec::new();
        view.extract_channel(1, &mut plane);
        assert_eq!(plane, vec![2.0, 5.0, 8.0, 11.0]);
        view.extract_channel(2, &mut plane);
        assert_eq!(plane, vec![3.0, 6.0, 9.0, 12.0]);
    }

    #[test]
    fn owned_image_rejects_oversized_buffer() {
        assert!(OwnedImage::new(vec![0u16; 5], 2, 2, 1).is_err());
        let img = OwnedImage::new(vec![0u16; 12], 2, 2, 3).unwrap();
        assert_eq!(img.view().stride(), 6);
    }

    #[test]
    fn owned_image_rejects_overflowing_row() {
        let err = OwnedImage::new(Vec::<u8>::new(), usize::MAX / 2, 1, 3).unwrap_err();
        assert_eq!(
            err,
            SsimError::InvalidDimensions {
                width: usize::MAX / 2,
                height: 1
            }
        );
    }
}
