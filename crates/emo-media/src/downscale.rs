//! Downscaling selected frames for interpretation.

use std::io::Cursor;

use emo_models::PreparedImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use tracing::debug;

use crate::error::MediaResult;

/// JPEG quality used for interpretation payloads.
pub const PAYLOAD_JPEG_QUALITY: u8 = 85;

/// Dimensions that fit `(width, height)` inside `bounds` with the aspect ratio
/// preserved. Images already inside the bounds are left as they are.
pub fn fit_within(width: u32, height: u32, bounds: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = bounds;
    if width == 0 || height == 0 || (width <= max_w && height <= max_h) {
        return (width, height);
    }
    let ratio = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    let w = ((width as f64 * ratio).round() as u32).clamp(1, max_w);
    let h = ((height as f64 * ratio).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Resize (never upscale) and JPEG-encode a frame.
pub fn prepare_for_interpretation(
    image: &DynamicImage,
    target_resolution: (u32, u32),
) -> MediaResult<PreparedImage> {
    let (width, height) = fit_within(image.width(), image.height(), target_resolution);

    let rgb = if (width, height) == (image.width(), image.height()) {
        image.to_rgb8()
    } else {
        image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8()
    };

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, PAYLOAD_JPEG_QUALITY).encode(
        rgb.as_raw(),
        width,
        height,
        ColorType::Rgb8,
    )?;
    let data = buffer.into_inner();

    debug!(
        source_width = image.width(),
        source_height = image.height(),
        width,
        height,
        bytes = data.len(),
        "Prepared interpretation payload"
    );

    Ok(PreparedImage::jpeg(data, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(1280, 720, (640, 480)), (640, 360));
        assert_eq!(fit_within(480, 960, (640, 480)), (240, 480));
        assert_eq!(fit_within(320, 240, (640, 480)), (320, 240));
    }

    #[test]
    fn test_prepare_downscales_and_encodes() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1280, 720, Rgb([200, 40, 40])));
        let prepared = prepare_for_interpretation(&image, (640, 480)).unwrap();

        assert_eq!((prepared.width, prepared.height), (640, 360));
        assert_eq!(&prepared.data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 360));
    }

    #[test]
    fn test_prepare_never_upscales() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([0, 0, 0])));
        let prepared = prepare_for_interpretation(&image, (640, 480)).unwrap();
        assert_eq!((prepared.width, prepared.height), (64, 48));
    }
}
