//! Convenience helpers for loading images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. The decoded channel
//! layout is preserved: luma stays single-channel, luma+alpha keeps two
//! channels, color images keep three or four.

use crate::image::OwnedImage;
use crate::util::{SsimError, SsimResult};
use image::{ColorType, DynamicImage};
use std::path::Path;

fn channel_count(color: ColorType) -> usize {
    match color {
        ColorType::L8 | ColorType::L16 => 1,
        ColorType::La8 | ColorType::La16 => 2,
        c if c.has_alpha() => 4,
        _ => 3,
    }
}

fn owned<T>(data: Vec<T>, width: u32, height: u32, channels: usize) -> SsimResult<OwnedImage<T>> {
    OwnedImage::new(data, width as usize, height as usize, channels)
}

/// Creates an owned 8-bit image from a dynamic image, keeping its channels.
pub fn owned_from_dynamic_image_u8(img: &DynamicImage) -> SsimResult<OwnedImage<u8>> {
    let (width, height) = (img.width(), img.height());
    let channels = channel_count(img.color());
    let data = match channels {
        1 => img.to_luma8().into_raw(),
        2 => img.to_luma_alpha8().into_raw(),
        3 => img.to_rgb8().into_raw(),
        _ => img.to_rgba8().into_raw(),
    };
    owned(data, width, height, channels)
}

/// Creates an owned 16-bit image from a dynamic image, keeping its channels.
///
/// 8-bit sources are widened by the `image` crate (`v * 257`).
pub fn owned_from_dynamic_image_u16(img: &DynamicImage) -> SsimResult<OwnedImage<u16>> {
    let (width, height) = (img.width(), img.height());
    let channels = channel_count(img.color());
    let data = match channels {
        1 => img.to_luma16().into_raw(),
        2 => img.to_luma_alpha16().into_raw(),
        3 => img.to_rgb16().into_raw(),
        _ => img.to_rgba16().into_raw(),
    };
    owned(data, width, height, channels)
}

fn open<P: AsRef<Path>>(path: P) -> SsimResult<DynamicImage> {
    image::open(path).map_err(|err| SsimError::ImageIo {
        reason: err.to_string(),
    })
}

/// Loads an image from disk as 8-bit samples.
pub fn load_image_u8<P: AsRef<Path>>(path: P) -> SsimResult<OwnedImage<u8>> {
    owned_from_dynamic_image_u8(&open(path)?)
}

/// Loads an image from disk as 16-bit samples.
pub fn load_image_u16<P: AsRef<Path>>(path: P) -> SsimResult<OwnedImage<u16>> {
    owned_from_dynamic_image_u16(&open(path)?)
}

#[cfg(test)]
mod tests {
    use super::{load_image_u8, owned_from_dynamic_image_u16, owned_from_dynamic_image_u8};
    use crate::util::SsimError;
    use image::{DynamicImage, GrayImage, RgbaImage};

    #[test]
    fn gray_images_stay_single_channel() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, image::Luma([9])));
        let owned = owned_from_dynamic_image_u8(&img).unwrap();
        assert_eq!(owned.channels(), 1);
        assert_eq!(owned.data(), &[9u8; 6]);
    }

    #[test]
    fn rgba_widens_to_u16() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 255])));
        let owned = owned_from_dynamic_image_u16(&img).unwrap();
        assert_eq!(owned.channels(), 4);
        assert_eq!(owned.data(), &[257u16, 514, 771, 65535]);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = load_image_u8("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, SsimError::ImageIo { .. }));
    }
}
