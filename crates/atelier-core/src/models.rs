//! Catalog entity types for the atelier media backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broad processing category for an uploaded file.
///
/// Decides the processing path in the upload orchestrator: images are
/// resized, videos are transcoded into resolution tiers, audio and
/// documents are stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
}

impl MediaKind {
    /// Derive the kind from a MIME type's top-level category.
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.split('/').next().unwrap_or("") {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            _ => Self::Document,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Document => write!(f, "document"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// One resized/transcoded derivative of an asset's original bytes.
///
/// Stored embedded in the catalog row as a JSONB map keyed by variant name
/// ("sm"/"md"/"lg"/"xl" for images, "480p"/"720p"/"1080p" for video).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaVariant {
    /// Public URL on the CDN.
    pub url: String,
    /// Storage path, needed for deletion.
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: i64,
}

/// Map from variant name to its derivative. BTreeMap keeps JSON output
/// stable across runs.
pub type VariantMap = BTreeMap<String, MediaVariant>;

/// One uploaded file and its derived metadata, as tracked in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Generation-time id, never content-derived: byte-identical uploads
    /// produce distinct assets.
    pub id: Uuid,
    pub original_filename: String,
    /// Sanitized filename used in storage paths and display.
    pub display_filename: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub size_bytes: i64,
    /// Path of the original upload on the object store.
    pub storage_path: String,
    /// Preferred URL: the largest produced variant, else the original.
    pub main_url: String,
    /// Pixel dimensions (image/video only).
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Compact blurhash preview string (image only, may be empty).
    pub placeholder: Option<String>,
    /// Dominant color as "#rrggbb" (image only).
    pub dominant_color: Option<String>,
    /// "blake3:<hex>" over the original bytes; change detection only,
    /// never identity.
    pub content_hash: Option<String>,
    pub variants: VariantMap,
    pub alt_text: Option<String>,
    /// Number of content entities currently citing this asset.
    pub ref_count: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaAsset {
    /// Every storage path owned by this asset: the original plus all
    /// variant paths. These are the blobs a hard delete must remove.
    pub fn all_paths(&self) -> Vec<&str> {
        let mut paths = vec![self.storage_path.as_str()];
        paths.extend(self.variants.values().map(|v| v.path.as_str()));
        paths
    }
}

/// Catalog insert payload, produced by the upload orchestrator.
#[derive(Debug, Clone)]
pub struct NewMediaAsset {
    pub id: Uuid,
    pub original_filename: String,
    pub display_filename: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub size_bytes: i64,
    pub storage_path: String,
    pub main_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub placeholder: Option<String>,
    pub dominant_color: Option<String>,
    pub content_hash: Option<String>,
    pub variants: VariantMap,
    pub alt_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_content_type("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_content_type("video/mp4"), MediaKind::Video);
        assert_eq!(
            MediaKind::from_content_type("application/pdf"),
            MediaKind::Document
        );
        assert_eq!(MediaKind::from_content_type(""), MediaKind::Document);
    }

    #[test]
    fn test_kind_display_roundtrip() {
        for kind in [
            MediaKind::Image,
            MediaKind::Audio,
            MediaKind::Video,
            MediaKind::Document,
        ] {
            let parsed: MediaKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_all_paths_includes_variants() {
        let mut variants = VariantMap::new();
        variants.insert(
            "sm".to_string(),
            MediaVariant {
                url: "https://cdn.example.com/media/2026/08/a-sm.jpg".to_string(),
                path: "media/2026/08/a-sm.jpg".to_string(),
                width: 640,
                height: 427,
                size_bytes: 1000,
            },
        );
        let asset = MediaAsset {
            id: Uuid::nil(),
            original_filename: "a.jpg".to_string(),
            display_filename: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            kind: MediaKind::Image,
            size_bytes: 5000,
            storage_path: "media/2026/08/a.jpg".to_string(),
            main_url: "https://cdn.example.com/media/2026/08/a-sm.jpg".to_string(),
            width: Some(800),
            height: Some(533),
            placeholder: None,
            dominant_color: None,
            content_hash: None,
            variants,
            alt_text: None,
            ref_count: 0,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let paths = asset.all_paths();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&"media/2026/08/a.jpg"));
        assert!(paths.contains(&"media/2026/08/a-sm.jpg"));
    }

    #[test]
    fn test_variant_map_serializes_sorted() {
        let mut variants = VariantMap::new();
        for name in ["xl", "sm", "md"] {
            variants.insert(
                name.to_string(),
                MediaVariant {
                    url: String::new(),
                    path: String::new(),
                    width: 1,
                    height: 1,
                    size_bytes: 0,
                },
            );
        }
        let json = serde_json::to_string(&variants).unwrap();
        let md = json.find("\"md\"").unwrap();
        let sm = json.find("\"sm\"").unwrap();
        let xl = json.find("\"xl\"").unwrap();
        assert!(md < sm && sm < xl);
    }
}
