//! Centralized default constants for the atelier media pipeline.
//!
//! This module is the single source of truth for shared default values.
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum upload size in bytes (100 MiB).
///
/// Override with `ATELIER_MAX_UPLOAD_BYTES`.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Maximum length of the sanitized filename stem (extension excluded).
pub const MAX_FILENAME_STEM_LEN: usize = 80;

/// Hex characters in the random disambiguating filename suffix.
pub const FILENAME_SUFFIX_LEN: usize = 8;

// =============================================================================
// IMAGE VARIANTS
// =============================================================================

/// Named target widths for image derivatives, ascending.
///
/// A target is skipped when the source width is less than half the target
/// width (never upscale meaningfully beyond source fidelity).
pub const IMAGE_SIZE_TABLE: &[(&str, u32)] =
    &[("sm", 640), ("md", 1024), ("lg", 1920), ("xl", 2560)];

/// JPEG quality applied uniformly to every image variant.
pub const IMAGE_JPEG_QUALITY: u8 = 82;

/// Edge length of the thumbnail fed into the blurhash encoder.
pub const PLACEHOLDER_SAMPLE_SIZE: u32 = 32;

/// Blurhash component counts (x, y).
pub const PLACEHOLDER_COMPONENTS: (u32, u32) = (4, 3);

/// Placeholder string when generation fails (progressive enhancement only).
pub const PLACEHOLDER_FALLBACK: &str = "";

/// Dominant color when extraction fails.
pub const DOMINANT_COLOR_FALLBACK: &str = "#000000";

// =============================================================================
// VIDEO VARIANTS
// =============================================================================

/// Named resolution tiers: (name, target height, max width).
///
/// A tier is kept only when the source height is no more than 20% below
/// the tier target; sources smaller than every tier get a single
/// best-effort encode at source resolution.
pub const VIDEO_TIER_TABLE: &[(&str, u32, u32)] =
    &[("480p", 480, 854), ("720p", 720, 1280), ("1080p", 1080, 1920)];

/// Fraction of the tier height the source must reach for the tier to apply.
pub const VIDEO_TIER_MIN_SOURCE_RATIO: f64 = 0.8;

/// Constant-quality rate control parameter (x264 CRF).
pub const VIDEO_CRF: u32 = 23;

/// Encoder preset traded for predictable batch throughput.
pub const VIDEO_PRESET: &str = "veryfast";

/// Audio codec and bitrate for video variants.
pub const VIDEO_AUDIO_CODEC: &str = "aac";
pub const VIDEO_AUDIO_BITRATE: &str = "128k";

// =============================================================================
// STORAGE
// =============================================================================

/// Root prefix for all media paths on the object store.
pub const STORAGE_PREFIX: &str = "media";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for media listing endpoints.
pub const PAGE_LIMIT: i64 = 50;

/// Maximum page size accepted from a client.
pub const PAGE_LIMIT_MAX: i64 = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size_table_ascending() {
        let widths: Vec<u32> = IMAGE_SIZE_TABLE.iter().map(|(_, w)| *w).collect();
        let mut sorted = widths.clone();
        sorted.sort_unstable();
        assert_eq!(widths, sorted);
    }

    #[test]
    fn test_video_tier_table_ascending() {
        let heights: Vec<u32> = VIDEO_TIER_TABLE.iter().map(|(_, h, _)| *h).collect();
        let mut sorted = heights.clone();
        sorted.sort_unstable();
        assert_eq!(heights, sorted);
    }

    #[test]
    fn test_tier_widths_match_16_9() {
        // Max widths are the 16:9 widths for each tier height.
        for (name, height, max_width) in VIDEO_TIER_TABLE {
            let expected = (*height as f64 * 16.0 / 9.0).round() as u32;
            // 854 is the conventional rounding of 853.33
            assert!(
                max_width.abs_diff(expected) <= 1,
                "tier {} width {} not 16:9 for height {}",
                name,
                max_width,
                height
            );
        }
    }
}
