//! Upload validation: size limits, the MIME/extension allow-list, magic-byte
//! cross-checks, and filename sanitization.
//!
//! The declared MIME type and the file extension are checked independently
//! and both must appear in the allow-list. For binary media the declared
//! type is additionally cross-checked against the sniffed magic bytes so a
//! renamed executable cannot pass as a JPEG.

use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::HashMap;

use crate::defaults::{FILENAME_SUFFIX_LEN, MAX_FILENAME_STEM_LEN};
use crate::error::{Error, Result};

/// Allow-list mapping accepted MIME types to their accepted extensions.
static ALLOWED_TYPES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    // Images
    m.insert("image/jpeg", &["jpg", "jpeg"]);
    m.insert("image/png", &["png"]);
    m.insert("image/webp", &["webp"]);
    m.insert("image/gif", &["gif"]);
    m.insert("image/avif", &["avif"]);
    m.insert("image/svg+xml", &["svg"]);
    // Audio
    m.insert("audio/mpeg", &["mp3"]);
    m.insert("audio/wav", &["wav"]);
    m.insert("audio/x-wav", &["wav"]);
    m.insert("audio/flac", &["flac"]);
    m.insert("audio/ogg", &["ogg"]);
    m.insert("audio/mp4", &["m4a"]);
    // Video
    m.insert("video/mp4", &["mp4", "m4v"]);
    m.insert("video/quicktime", &["mov"]);
    m.insert("video/webm", &["webm"]);
    // Documents
    m.insert("application/pdf", &["pdf"]);
    m
});

/// Extract the lowercase extension from a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check that a declared MIME type is in the allow-list.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains_key(content_type)
}

/// Check that an extension appears in the allow-list for any accepted type.
pub fn is_allowed_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    ALLOWED_TYPES.values().any(|exts| exts.contains(&ext.as_str()))
}

/// Validate an upload before any processing.
///
/// Checks, in order: size limit, declared MIME type, file extension, and
/// (for binary media) magic-byte agreement with the declared type.
pub fn validate_upload(
    filename: &str,
    content_type: &str,
    data: &[u8],
    max_bytes: usize,
) -> Result<()> {
    if data.len() > max_bytes {
        return Err(Error::FileTooLarge {
            size: data.len(),
            max: max_bytes,
        });
    }

    if !is_allowed_content_type(content_type) {
        return Err(Error::UnsupportedType(format!(
            "MIME type {} is not allowed",
            content_type
        )));
    }

    let ext = file_extension(filename).ok_or_else(|| {
        Error::UnsupportedType(format!("filename {:?} has no extension", filename))
    })?;
    if !is_allowed_extension(&ext) {
        return Err(Error::UnsupportedType(format!(
            "extension .{} is not allowed",
            ext
        )));
    }

    // SVG is text-based XML and has no magic bytes; everything else in the
    // allow-list is a binary format infer can recognize.
    if content_type != "image/svg+xml" {
        match infer::get(data) {
            Some(kind) if sniffed_matches_declared(kind.mime_type(), content_type) => {}
            Some(kind) => {
                return Err(Error::UnsupportedType(format!(
                    "declared {} but content is {}",
                    content_type,
                    kind.mime_type()
                )));
            }
            None => {
                return Err(Error::UnsupportedType(format!(
                    "declared {} but content has no recognizable signature",
                    content_type
                )));
            }
        }
    }

    Ok(())
}

/// Compare a sniffed MIME type against the declared one.
///
/// Container formats overlap (mov/mp4 share the ISO base media format,
/// m4a sniffs as audio/m4a or video/mp4), so agreement on the top-level
/// category is enough once both sides passed the allow-list.
fn sniffed_matches_declared(sniffed: &str, declared: &str) -> bool {
    if sniffed == declared {
        return true;
    }
    let top = |m: &str| m.split('/').next().unwrap_or("").to_string();
    let (s_top, d_top) = (top(sniffed), top(declared));
    if s_top == d_top && !s_top.is_empty() {
        return true;
    }
    // AAC audio in an MP4 container sniffs as video/mp4.
    matches!(
        (declared, sniffed),
        ("audio/mp4", "video/mp4") | ("video/mp4", "audio/m4a")
    )
}

/// Derive a sanitized display filename with a random disambiguating suffix.
///
/// Lowercases, strips to `[a-z0-9._-]`, collapses repeated separators,
/// truncates the stem, then appends a short random hex suffix before the
/// extension. The suffix guarantees no two uploads collide on storage path
/// even for identical original names, without a global uniqueness check.
pub fn sanitize_display_filename(original: &str) -> String {
    let name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() && !e.is_empty() => (s, Some(e)),
        _ => (name, None),
    };

    let mut cleaned = String::with_capacity(stem.len());
    let mut last_was_sep = true; // also trims leading separators
    for c in stem.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            cleaned.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            cleaned.push('-');
            last_was_sep = true;
        }
    }
    let cleaned = cleaned.trim_end_matches('-');
    let stem = if cleaned.is_empty() { "file" } else { cleaned };
    let stem: String = stem.chars().take(MAX_FILENAME_STEM_LEN).collect();
    let stem = stem.trim_end_matches('-');

    let suffix = random_suffix();
    match ext {
        Some(e) => format!("{}-{}.{}", stem, suffix, e.to_ascii_lowercase()),
        None => format!("{}-{}", stem, suffix),
    }
}

/// Short random hex string used to disambiguate storage paths.
fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..FILENAME_SUFFIX_LEN)
        .map(|_| {
            let n: u8 = rng.gen_range(0..16);
            char::from_digit(n as u32, 16).unwrap_or('0')
        })
        .collect()
}
