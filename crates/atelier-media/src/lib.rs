//! # atelier-media
//!
//! Derivative generation for the atelier media pipeline:
//! - image variants (resize + JPEG encode via the `image` crate)
//! - video resolution tiers (spawned ffmpeg/ffprobe)
//! - perceptual placeholders (blurhash + dominant color)
//!
//! Image decoding is CPU-bound; callers on an async runtime should wrap
//! [`image_variants`] and [`summarize`] in `spawn_blocking`.

pub mod image_variants;
pub mod placeholder;
pub mod video_variants;

pub use image_variants::{image_dimensions, image_variants, EncodedVariant};
pub use placeholder::{summarize, ImageSummary};
pub use video_variants::{
    probe_dimensions, select_tiers, tier_dimensions, video_variants, VideoEncodeResult,
};
