//! Perceptual placeholder generation: blurhash string plus dominant color.
//!
//! Placeholders are a progressive-enhancement feature. Generation never
//! fails the surrounding upload: internal errors degrade to an empty
//! placeholder and a black dominant color, logged at WARN.

use image::imageops::FilterType;
use tracing::warn;

use atelier_core::defaults::{
    DOMINANT_COLOR_FALLBACK, PLACEHOLDER_COMPONENTS, PLACEHOLDER_FALLBACK,
    PLACEHOLDER_SAMPLE_SIZE,
};

/// Compact visual summary of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// Blurhash string decodable client-side before the real image loads.
    /// Empty when generation failed.
    pub placeholder: String,
    /// Dominant color as "#rrggbb".
    pub dominant_color: String,
}

impl Default for ImageSummary {
    fn default() -> Self {
        Self {
            placeholder: PLACEHOLDER_FALLBACK.to_string(),
            dominant_color: DOMINANT_COLOR_FALLBACK.to_string(),
        }
    }
}

/// Summarize image bytes into a placeholder and dominant color.
///
/// Downsamples to a tiny fixed grid before encoding the blurhash and to a
/// single pixel for the dominant color. Deterministic for a given input.
pub fn summarize(data: &[u8]) -> ImageSummary {
    match try_summarize(data) {
        Ok(summary) => summary,
        Err(reason) => {
            warn!(
                subsystem = "media",
                component = "placeholder",
                error = %reason,
                "Placeholder generation failed, using defaults"
            );
            ImageSummary::default()
        }
    }
}

fn try_summarize(data: &[u8]) -> Result<ImageSummary, String> {
    let img = image::load_from_memory(data).map_err(|e| format!("decode: {}", e))?;
    if img.width() == 0 || img.height() == 0 {
        return Err("empty image".to_string());
    }

    // Tiny thumbnail keeps the blurhash DCT cheap regardless of source size.
    let thumb = img
        .resize(
            PLACEHOLDER_SAMPLE_SIZE,
            PLACEHOLDER_SAMPLE_SIZE,
            FilterType::Triangle,
        )
        .to_rgba8();
    let (cx, cy) = PLACEHOLDER_COMPONENTS;
    let placeholder = blurhash::encode(cx, cy, thumb.width(), thumb.height(), thumb.as_raw())
        .map_err(|e| format!("blurhash: {:?}", e))?;

    let pixel = img.resize_exact(1, 1, FilterType::Triangle).to_rgb8();
    let [r, g, b] = pixel.get_pixel(0, 0).0;
    let dominant_color = format!("#{:02x}{:02x}{:02x}", r, g, b);

    Ok(ImageSummary {
        placeholder,
        dominant_color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_summarize_produces_placeholder() {
        let data = png_bytes(200, 100, [200, 30, 30]);
        let summary = summarize(&data);
        assert!(!summary.placeholder.is_empty());
        assert!(summary.dominant_color.starts_with('#'));
        assert_eq!(summary.dominant_color.len(), 7);
    }

    #[test]
    fn test_summarize_idempotent() {
        let data = png_bytes(64, 64, [10, 120, 240]);
        assert_eq!(summarize(&data), summarize(&data));
    }

    #[test]
    fn test_dominant_color_of_solid_image() {
        let data = png_bytes(50, 50, [0, 255, 0]);
        let summary = summarize(&data);
        assert_eq!(summary.dominant_color, "#00ff00");
    }

    #[test]
    fn test_garbage_degrades_to_defaults() {
        let summary = summarize(b"not an image");
        assert_eq!(summary, ImageSummary::default());
        assert_eq!(summary.placeholder, "");
        assert_eq!(summary.dominant_color, "#000000");
    }

    #[test]
    fn test_different_images_differ() {
        let red = summarize(&png_bytes(64, 64, [255, 0, 0]));
        let blue = summarize(&png_bytes(64, 64, [0, 0, 255]));
        assert_ne!(red.placeholder, blue.placeholder);
        assert_ne!(red.dominant_color, blue.dominant_color);
    }
}
