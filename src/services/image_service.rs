//! Pure image helpers: metadata extraction and the black-and-white filter.
//!
//! Nothing here touches storage; callers pass raw bytes in and get values out.

use exif::{In, Tag, Value};
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

use crate::models::image_metadata::ImageMetadata;

#[derive(Debug, Error)]
pub enum ImageServiceError {
    #[error("unrecognized image format")]
    UnsupportedFormat,
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
}

pub type ImageResult<T> = Result<T, ImageServiceError>;

/// Output of an in-memory transform.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

fn decode(bytes: &[u8]) -> ImageResult<(ImageFormat, DynamicImage)> {
    let format = image::guess_format(bytes).map_err(|_| ImageServiceError::UnsupportedFormat)?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(ImageServiceError::Decode)?;
    Ok((format, img))
}

/// Derive format, dimensions, color layout and optional EXIF fields.
///
/// A missing or unreadable EXIF block leaves the camera fields empty rather
/// than failing the extraction.
pub fn extract_metadata(bytes: &[u8]) -> ImageResult<ImageMetadata> {
    let (format, img) = decode(bytes)?;
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok();

    let (make, model, iso, date_time) = match &exif {
        Some(exif) => (
            exif_text(exif, Tag::Make),
            exif_text(exif, Tag::Model),
            exif
                .get_field(Tag::PhotographicSensitivity, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0)),
            exif_text(exif, Tag::DateTimeOriginal).or_else(|| exif_text(exif, Tag::DateTime)),
        ),
        None => (None, None, None, None),
    };

    Ok(ImageMetadata {
        format: format_name(format),
        content_type: format.to_mime_type().to_string(),
        width: img.width(),
        height: img.height(),
        color: color_name(img.color()).to_string(),
        make,
        model,
        iso,
        date_time,
        size_bytes: bytes.len() as u64,
    })
}

/// Grayscale the image and re-encode it in its original format.
pub fn convert_bw(bytes: &[u8]) -> ImageResult<TransformedImage> {
    let (format, img) = decode(bytes)?;

    // JPEG has no alpha channel.
    let gray = match format {
        ImageFormat::Jpeg => DynamicImage::ImageLuma8(img.to_luma8()),
        _ => img.grayscale(),
    };

    // Some encoders only take RGB(A) input; the pixels stay gray either way.
    let encoded = encode(&gray, format)
        .or_else(|err| match err {
            image::ImageError::Unsupported(_) => {
                encode(&DynamicImage::ImageRgba8(gray.to_rgba8()), format)
            }
            other => Err(other),
        })
        .map_err(ImageServiceError::Encode)?;

    Ok(TransformedImage {
        bytes: encoded,
        content_type: format.to_mime_type(),
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_ascii_lowercase()
}

fn color_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "l8",
        ColorType::La8 => "la8",
        ColorType::Rgb8 => "rgb8",
        ColorType::Rgba8 => "rgba8",
        ColorType::L16 => "l16",
        ColorType::La16 => "la16",
        ColorType::Rgb16 => "rgb16",
        ColorType::Rgba16 => "rgba16",
        ColorType::Rgb32F => "rgb32f",
        ColorType::Rgba32F => "rgba32f",
        _ => "unknown",
    }
}

/// First ASCII component of a tag, trimmed of padding and NULs.
fn exif_text(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let text = match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|part| String::from_utf8_lossy(part).into_owned())?,
        _ => field.display_value().to_string(),
    };
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn sample(format: ImageFormat) -> Vec<u8> {
        let mut img = RgbImage::new(4, 3);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x % 2 == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) };
        }
        encode(&DynamicImage::ImageRgb8(img), format).unwrap()
    }

    #[test]
    fn extracts_png_metadata() {
        let data = sample(ImageFormat::Png);
        let meta = extract_metadata(&data).unwrap();

        assert_eq!(meta.format, "png");
        assert_eq!(meta.content_type, "image/png");
        assert_eq!((meta.width, meta.height), (4, 3));
        assert_eq!(meta.color, "rgb8");
        assert_eq!(meta.size_bytes, data.len() as u64);
        assert_eq!(meta.make, None);
        assert_eq!(meta.iso, None);
    }

    #[test]
    fn extracts_jpeg_metadata() {
        let meta = extract_metadata(&sample(ImageFormat::Jpeg)).unwrap();
        assert_eq!(meta.format, "jpeg");
        assert_eq!(meta.content_type, "image/jpeg");
        assert_eq!((meta.width, meta.height), (4, 3));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = extract_metadata(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageServiceError::UnsupportedFormat));
    }

    #[test]
    fn rejects_truncated_image() {
        let mut data = sample(ImageFormat::Png);
        data.truncate(24);
        let err = extract_metadata(&data).unwrap_err();
        assert!(matches!(err, ImageServiceError::Decode(_)));
    }

    #[test]
    fn convert_bw_png_is_grayscale() {
        let out = convert_bw(&sample(ImageFormat::Png)).unwrap();
        assert_eq!(out.content_type, "image/png");

        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(img.color(), ColorType::L8);
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn convert_bw_jpeg_drops_color() {
        let out = convert_bw(&sample(ImageFormat::Jpeg)).unwrap();
        assert_eq!(out.content_type, "image/jpeg");

        let img = image::load_from_memory_with_format(&out.bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(img.color(), ColorType::L8);
    }

    #[test]
    fn convert_bw_keeps_alpha_for_png() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 200, 30, 128]));
        let data = encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png).unwrap();

        let out = convert_bw(&data).unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_luma_alpha8();
        assert_eq!(decoded.get_pixel(0, 0)[1], 128);
    }

    #[test]
    fn color_names_are_lowercase() {
        assert_eq!(color_name(ColorType::La8), "la8");
        assert_eq!(color_name(ColorType::Rgba16), "rgba16");
    }
}
