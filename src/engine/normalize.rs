//! Upload normalization: any decodable image in, RGB JPEG out

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage};

use crate::utils::image::encode_jpeg;

/// Quality used for the JPEG sent upstream
pub const UPSTREAM_JPEG_QUALITY: u8 = 95;

/// A decoded upload together with the JPEG the upstream API receives
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Oriented RGB pixels, alpha dropped
    pub rgb: RgbImage,
    /// JPEG encoding of `rgb`
    pub jpeg: Vec<u8>,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }
}

/// Decode `data` and re-encode it as RGB JPEG at `quality`.
///
/// Alpha and palette images are flattened to RGB by discarding alpha, not
/// by compositing against a background.
pub fn normalize(data: &[u8], quality: u8) -> Result<NormalizedImage> {
    let image = decode_image(data)?;
    let rgb = image.to_rgb8();
    let jpeg = encode_jpeg(&rgb, quality)?;
    Ok(NormalizedImage { rgb, jpeg })
}

/// Decode image from bytes with EXIF orientation handling
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(data).context("bytes are not a decodable image")?;
    Ok(apply_exif_orientation(data, image))
}

/// Phone cameras store rotation as an EXIF tag instead of rotating pixels.
/// Rectangles from the API refer to the upright image, so rotate first.
fn apply_exif_orientation(data: &[u8], image: DynamicImage) -> DynamicImage {
    let orientation = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif_data) => exif_data
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    };

    // https://exiftool.org/TagNames/EXIF.html (Orientation)
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn rgba_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 0]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_alpha_image_becomes_rgb_jpeg() {
        let normalized = normalize(&rgba_png(16, 12), UPSTREAM_JPEG_QUALITY).unwrap();

        assert_eq!(image::guess_format(&normalized.jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&normalized.jpeg).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[test]
    fn test_alpha_is_discarded_not_composited() {
        // Fully transparent pixels keep their colour instead of turning white or black
        let normalized = normalize(&rgba_png(4, 4), UPSTREAM_JPEG_QUALITY).unwrap();
        assert_eq!(normalized.rgb.get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn test_undecodable_bytes_fail() {
        assert!(normalize(b"definitely not an image", UPSTREAM_JPEG_QUALITY).is_err());
    }

    #[test]
    fn test_dimensions_exposed() {
        let normalized = normalize(&rgba_png(9, 3), UPSTREAM_JPEG_QUALITY).unwrap();
        assert_eq!((normalized.width(), normalized.height()), (9, 3));
    }
}
