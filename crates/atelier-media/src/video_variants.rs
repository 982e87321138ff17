//! Video variant generation: resolution tiers encoded via spawned ffmpeg.
//!
//! Tier selection and target-dimension math are pure functions so they can
//! be tested without an encoder. The encode itself shells out to `ffmpeg`
//! (and `ffprobe` for source dimensions), the conventional Rust approach
//! for H.264 output.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use atelier_core::defaults::{
    VIDEO_AUDIO_BITRATE, VIDEO_AUDIO_CODEC, VIDEO_CRF, VIDEO_PRESET, VIDEO_TIER_MIN_SOURCE_RATIO,
};
use atelier_core::{Error, Result};

use crate::image_variants::EncodedVariant;

/// Select the resolution tiers a source can meaningfully serve.
///
/// A tier is kept when the source height is not more than ~20% below the
/// tier target. Returns an empty list for sources smaller than every tier;
/// the caller then produces a single best-effort encode at source
/// resolution so every video asset has at least one playable variant.
pub fn select_tiers<'t>(
    src_height: u32,
    table: &'t [(&'t str, u32, u32)],
) -> Vec<&'t (&'t str, u32, u32)> {
    table
        .iter()
        .filter(|(_, tier_height, _)| {
            src_height as f64 >= *tier_height as f64 * VIDEO_TIER_MIN_SOURCE_RATIO
        })
        .collect()
}

/// Target dimensions for a tier: width from the source aspect ratio capped
/// at the tier's maximum width, both axes rounded down to even values for
/// the encoder.
pub fn tier_dimensions(src_w: u32, src_h: u32, tier_height: u32, max_width: u32) -> (u32, u32) {
    let height = tier_height.min(src_h);
    let width = ((height as f64 * src_w as f64 / src_h as f64).round() as u32).min(max_width);
    (even(width), even(height))
}

fn even(n: u32) -> u32 {
    (n & !1).max(2)
}

/// Probe source pixel dimensions with ffprobe.
pub async fn probe_dimensions(input: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0",
        ])
        .arg(input)
        .output()
        .await
        .map_err(|e| Error::TranscodeFailed(format!("ffprobe spawn: {}", e)))?;

    if !output.status.success() {
        return Err(Error::TranscodeFailed(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&text)
}

fn parse_probe_output(text: &str) -> Result<(u32, u32)> {
    let line = text.lines().next().unwrap_or("").trim();
    let mut parts = line.split(',');
    let width = parts
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| Error::TranscodeFailed(format!("ffprobe output {:?}", line)))?;
    let height = parts
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| Error::TranscodeFailed(format!("ffprobe output {:?}", line)))?;
    if width == 0 || height == 0 {
        return Err(Error::TranscodeFailed("zero-sized video stream".to_string()));
    }
    Ok((width, height))
}

/// Output of the video encode step: probed source dimensions plus every
/// produced tier.
#[derive(Debug)]
pub struct VideoEncodeResult {
    pub source_width: u32,
    pub source_height: u32,
    pub variants: Vec<EncodedVariant>,
}

/// Produce each applicable resolution tier as H.264/AAC MP4.
///
/// Failure of an individual tier's encode aborts the whole call: a video
/// asset with silently missing tiers is a worse failure mode than an
/// explicit error.
pub async fn video_variants(data: &[u8], table: &[(&str, u32, u32)]) -> Result<VideoEncodeResult> {
    let workdir = tempfile::tempdir()?;
    let input = workdir.path().join("source.bin");
    tokio::fs::write(&input, data).await?;

    let (src_w, src_h) = probe_dimensions(&input).await?;
    let tiers = select_tiers(src_h, table);

    let mut out = Vec::new();
    if tiers.is_empty() {
        // Below every tier: one best-effort encode at source resolution.
        let (w, h) = (even(src_w), even(src_h));
        info!(
            subsystem = "media",
            component = "transcoder",
            src_width = src_w,
            src_height = src_h,
            "Source below all tiers, producing single source-resolution encode"
        );
        let bytes = encode_tier(&input, workdir.path(), "source", w, h).await?;
        out.push(EncodedVariant {
            name: "source".to_string(),
            width: w,
            height: h,
            bytes,
        });
        return Ok(VideoEncodeResult {
            source_width: src_w,
            source_height: src_h,
            variants: out,
        });
    }

    for (name, tier_height, max_width) in tiers {
        let (w, h) = tier_dimensions(src_w, src_h, *tier_height, *max_width);
        debug!(
            subsystem = "media",
            component = "transcoder",
            variant = name,
            width = w,
            height = h,
            "Encoding video tier"
        );
        let bytes = encode_tier(&input, workdir.path(), name, w, h).await?;
        out.push(EncodedVariant {
            name: (*name).to_string(),
            width: w,
            height: h,
            bytes,
        });
    }
    Ok(VideoEncodeResult {
        source_width: src_w,
        source_height: src_h,
        variants: out,
    })
}

/// Run one ffmpeg encode. Constant-quality rate control, fixed preset,
/// fixed audio codec/bitrate, and `+faststart` so the moov atom sits at
/// the front for progressive playback.
async fn encode_tier(
    input: &Path,
    workdir: &Path,
    name: &str,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let output_path = workdir.join(format!("{}.mp4", name));
    let scale = format!("scale={}:{}", width, height);

    let output = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(input)
        .args(["-vf", &scale, "-c:v", "libx264"])
        .args(["-crf", &VIDEO_CRF.to_string(), "-preset", VIDEO_PRESET])
        .args(["-c:a", VIDEO_AUDIO_CODEC, "-b:a", VIDEO_AUDIO_BITRATE])
        .args(["-movflags", "+faststart"])
        .arg(&output_path)
        .output()
        .await
        .map_err(|e| Error::TranscodeFailed(format!("ffmpeg spawn: {}", e)))?;

    if !output.status.success() {
        return Err(Error::TranscodeFailed(format!(
            "ffmpeg tier {} exited with {}: {}",
            name,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(tokio::fs::read(&output_path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::defaults::VIDEO_TIER_TABLE;

    #[test]
    fn test_select_tiers_full_hd_source() {
        let tiers = select_tiers(1080, VIDEO_TIER_TABLE);
        let names: Vec<&str> = tiers.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(names, vec!["480p", "720p", "1080p"]);
    }

    #[test]
    fn test_select_tiers_skips_above_source() {
        // 720 source: 1080p needs >= 864, so it is skipped.
        let tiers = select_tiers(720, VIDEO_TIER_TABLE);
        let names: Vec<&str> = tiers.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(names, vec!["480p", "720p"]);
    }

    #[test]
    fn test_select_tiers_within_twenty_percent_below() {
        // 900 >= 1080 * 0.8 = 864: the 1080p tier still applies.
        let tiers = select_tiers(900, VIDEO_TIER_TABLE);
        let names: Vec<&str> = tiers.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(names, vec!["480p", "720p", "1080p"]);
    }

    #[test]
    fn test_select_tiers_boundary() {
        assert_eq!(select_tiers(864, VIDEO_TIER_TABLE).len(), 3);
        assert_eq!(select_tiers(863, VIDEO_TIER_TABLE).len(), 2);
    }

    #[test]
    fn test_select_tiers_tiny_source_empty() {
        // Below 480 * 0.8 = 384: nothing qualifies.
        assert!(select_tiers(240, VIDEO_TIER_TABLE).is_empty());
    }

    #[test]
    fn test_tier_dimensions_16_9() {
        let (w, h) = tier_dimensions(1920, 1080, 720, 1280);
        assert_eq!((w, h), (1280, 720));
    }

    #[test]
    fn test_tier_dimensions_caps_wide_sources() {
        // Ultra-wide 21:9 source: aspect width 1680 exceeds the 720p cap.
        let (w, h) = tier_dimensions(2560, 1080, 720, 1280);
        assert_eq!(h, 720);
        assert_eq!(w, 1280);
    }

    #[test]
    fn test_tier_dimensions_even() {
        // 4:3-ish odd source dims still produce even encoder dims.
        let (w, h) = tier_dimensions(639, 481, 480, 854);
        assert_eq!(w % 2, 0);
        assert_eq!(h % 2, 0);
    }

    #[test]
    fn test_tier_dimensions_never_exceed_source_height() {
        let (_, h) = tier_dimensions(854, 400, 480, 854);
        assert!(h <= 400);
    }

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_probe_output("1920,1080\n").unwrap(), (1920, 1080));
        assert_eq!(parse_probe_output("640,360").unwrap(), (640, 360));
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("garbage").is_err());
        assert!(parse_probe_output("0,0").is_err());
    }
}
