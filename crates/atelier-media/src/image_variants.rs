//! Image variant generation: decode once, resize per size table, encode JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tracing::debug;

use atelier_core::defaults::IMAGE_JPEG_QUALITY;
use atelier_core::{Error, Result};

/// One encoded derivative ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedVariant {
    pub name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Report pixel dimensions from the image header without a full decode.
pub fn image_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::TranscodeFailed(format!("format detection: {}", e)))?
        .into_dimensions()
        .map_err(|e| Error::TranscodeFailed(format!("image header decode: {}", e)))
}

/// Produce every applicable resolution from the size table as JPEG.
///
/// For each `(name, target_width)` in ascending order:
/// - the target is skipped when the source width is less than half the
///   target width (no meaningful upscale beyond source fidelity);
/// - otherwise the image is resized preserving aspect ratio, never
///   enlarged beyond source dimensions, and encoded at a fixed quality.
///
/// Deterministic: the same bytes and table always yield the same variant
/// names and dimensions. Any decode/encode failure aborts the whole set.
pub fn image_variants(data: &[u8], table: &[(&str, u32)]) -> Result<Vec<EncodedVariant>> {
    let source = decode(data)?;
    let (src_w, src_h) = (source.width(), src_h_nonzero(&source)?);

    let mut out = Vec::new();
    for (name, target_width) in table {
        if src_w < target_width / 2 {
            debug!(
                subsystem = "media",
                component = "transcoder",
                variant = name,
                src_width = src_w,
                target_width,
                "Skipping variant, source below half target width"
            );
            continue;
        }

        let width = (*target_width).min(src_w);
        let height = scaled_height(src_w, src_h, width);
        let resized = if width == src_w {
            source.clone()
        } else {
            // Height was computed from the source aspect ratio, so an exact
            // resize preserves it without the fit-in-box rounding drift.
            source.resize_exact(width, height.max(1), FilterType::Lanczos3)
        };
        let bytes = encode_jpeg(&resized)?;
        out.push(EncodedVariant {
            name: (*name).to_string(),
            width: resized.width(),
            height: resized.height(),
            bytes,
        });
    }
    Ok(out)
}

fn decode(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data)
        .map_err(|e| Error::TranscodeFailed(format!("image decode: {}", e)))
}

fn src_h_nonzero(img: &DynamicImage) -> Result<u32> {
    match img.height() {
        0 => Err(Error::TranscodeFailed("zero-height image".to_string())),
        h => Ok(h),
    }
}

/// Height for a target width, preserving the source aspect ratio.
fn scaled_height(src_w: u32, src_h: u32, target_w: u32) -> u32 {
    ((target_w as u64 * src_h as u64) as f64 / src_w as f64).round() as u32
}

/// Encode to JPEG at the fixed pipeline quality. Alpha is flattened since
/// JPEG has no alpha channel.
fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, IMAGE_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::TranscodeFailed(format!("jpeg encode: {}", e)))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    const TABLE: &[(&str, u32)] = &[("sm", 640), ("md", 1024), ("lg", 1920), ("xl", 2560)];

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_large_source_produces_all_variants() {
        // 3000 >= 2560/2, so even the xl target is kept.
        let data = png_bytes(3000, 2000);
        let variants = image_variants(&data, TABLE).unwrap();
        let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["sm", "md", "lg", "xl"]);
        for v in &variants {
            assert!(v.width <= 3000, "{} exceeds source width", v.name);
        }
    }

    #[test]
    fn test_tiny_source_produces_no_variants() {
        // 300 < 640/2 = 320, so even sm is skipped.
        let data = png_bytes(300, 200);
        let variants = image_variants(&data, TABLE).unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn test_boundary_at_exactly_half_target() {
        // 320 == 640/2 keeps sm; 319 drops it.
        let at = image_variants(&png_bytes(320, 200), TABLE).unwrap();
        assert_eq!(at.len(), 1);
        assert_eq!(at[0].name, "sm");

        let below = image_variants(&png_bytes(319, 200), TABLE).unwrap();
        assert!(below.is_empty());
    }

    #[test]
    fn test_no_enlargement_beyond_source() {
        // Source 800 wide: md (1024) qualifies (800 >= 512) but must be
        // capped at the source width.
        let data = png_bytes(800, 600);
        let variants = image_variants(&data, TABLE).unwrap();
        let md = variants.iter().find(|v| v.name == "md").unwrap();
        assert_eq!(md.width, 800);
        assert_eq!(md.height, 600);
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        let data = png_bytes(3000, 2000);
        let variants = image_variants(&data, TABLE).unwrap();
        for v in &variants {
            let expected_h = (v.width as f64 * 2000.0 / 3000.0).round() as u32;
            assert!(
                v.height.abs_diff(expected_h) <= 1,
                "variant {} is {}x{}, expected height ~{}",
                v.name,
                v.width,
                v.height,
                expected_h
            );
        }
    }

    #[test]
    fn test_variant_widths_do_not_exceed_targets() {
        let data = png_bytes(3000, 2000);
        let variants = image_variants(&data, TABLE).unwrap();
        for (v, (name, target)) in variants.iter().zip(TABLE) {
            assert_eq!(&v.name, name);
            assert!(v.width <= *target);
        }
    }

    #[test]
    fn test_deterministic_variant_set() {
        let data = png_bytes(1200, 900);
        let a = image_variants(&data, TABLE).unwrap();
        let b = image_variants(&data, TABLE).unwrap();
        let names_a: Vec<_> = a.iter().map(|v| v.name.clone()).collect();
        let names_b: Vec<_> = b.iter().map(|v| v.name.clone()).collect();
        assert_eq!(names_a, names_b);
        assert_eq!(a[0].bytes, b[0].bytes);
    }

    #[test]
    fn test_variants_decode_as_jpeg() {
        let data = png_bytes(700, 500);
        let variants = image_variants(&data, TABLE).unwrap();
        let sm = &variants[0];
        let decoded = image::load_from_memory(&sm.bytes).unwrap();
        assert_eq!(decoded.width(), sm.width);
        assert_eq!(decoded.height(), sm.height);
        let reader = ImageReader::new(Cursor::new(&sm.bytes))
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_garbage_input_fails_with_transcode_error() {
        let err = image_variants(b"definitely not an image", TABLE).unwrap_err();
        assert!(matches!(err, Error::TranscodeFailed(_)));
    }

    #[test]
    fn test_image_dimensions() {
        let data = png_bytes(123, 45);
        assert_eq!(image_dimensions(&data).unwrap(), (123, 45));
    }
}
