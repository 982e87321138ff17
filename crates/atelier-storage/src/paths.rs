//! Storage path construction.
//!
//! Paths are date-bucketed (`media/{yyyy}/{mm}/...`) for human browsability
//! of the object store. Uniqueness comes from the random suffix the
//! sanitizer embeds in the display filename, not from these helpers.

use chrono::{DateTime, Datelike, Utc};

use atelier_core::defaults::STORAGE_PREFIX;

/// Year/month bucket for a new upload, e.g. `media/2026/08`.
pub fn date_prefix(now: DateTime<Utc>) -> String {
    format!("{}/{}/{:02}", STORAGE_PREFIX, now.year(), now.month())
}

/// Path for the original upload under a date bucket.
pub fn object_path(prefix: &str, display_filename: &str) -> String {
    format!("{}/{}", prefix, display_filename)
}

/// Path for a named variant, derived from the original's path by inserting
/// the variant name before a new extension:
/// `media/2026/08/sunset-a1b2c3d4.png` + ("md", "jpg") →
/// `media/2026/08/sunset-a1b2c3d4-md.jpg`.
pub fn variant_path(original_path: &str, variant_name: &str, ext: &str) -> String {
    let stem = match original_path.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => original_path,
    };
    format!("{}-{}.{}", stem, variant_name, ext)
}
