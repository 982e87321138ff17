//! Upload orchestration: the unit of work for one uploaded file.
//!
//! Validates the upload, decides the processing path by media kind, drives
//! the transcoder and placeholder generator, pushes every blob to the
//! object store, and commits the catalog row last. Any failure before the
//! insert leaves no row behind; blobs already uploaded by the failed
//! attempt are orphaned and reclaimed by an out-of-band pass.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use atelier_core::defaults::{IMAGE_SIZE_TABLE, MAX_UPLOAD_BYTES, VIDEO_TIER_TABLE};
use atelier_core::{
    compute_content_hash, sanitize_display_filename, validate_upload, Error, MediaAsset,
    MediaCatalog, MediaKind, MediaVariant, NewMediaAsset, Result, VariantMap,
};
use atelier_media::{image_dimensions, image_variants, summarize, EncodedVariant};
use atelier_storage::{date_prefix, object_path, variant_path, ObjectStore};

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// One incoming file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub original_filename: String,
    pub content_type: String,
    pub alt_text: Option<String>,
}

/// Coordinates validation, derivative generation, storage uploads, and the
/// final catalog insert for uploads; pairs with deletion in
/// [`crate::remove`].
pub struct MediaService {
    catalog: Arc<dyn MediaCatalog>,
    store: Arc<dyn ObjectStore>,
    config: UploadConfig,
}

/// Derivatives produced before any upload happens.
struct ProcessedMedia {
    width: Option<i32>,
    height: Option<i32>,
    placeholder: Option<String>,
    dominant_color: Option<String>,
    content_hash: Option<String>,
    /// Encoded variants and the content type they are served with.
    variants: Vec<EncodedVariant>,
    variant_content_type: &'static str,
    variant_ext: &'static str,
}

impl MediaService {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        store: Arc<dyn ObjectStore>,
        config: UploadConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn MediaCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Process one uploaded file end to end.
    ///
    /// On success every URL referenced by the returned asset is live on the
    /// object store. On failure no catalog row exists.
    pub async fn upload(&self, req: UploadRequest) -> Result<MediaAsset> {
        let start = Instant::now();
        validate_upload(
            &req.original_filename,
            &req.content_type,
            &req.bytes,
            self.config.max_upload_bytes,
        )?;

        let kind = MediaKind::from_content_type(&req.content_type);
        let id = Uuid::now_v7();
        let display_filename = sanitize_display_filename(&req.original_filename);
        let prefix = date_prefix(Utc::now());
        let storage_path = object_path(&prefix, &display_filename);

        let processed = self.process(kind, &req).await?;

        // Upload the original, then each variant. A failed put aborts the
        // whole call; blobs already written stay orphaned for the cleanup
        // pass rather than blocking the error path on best-effort undo.
        let original_url = self
            .store
            .put(&storage_path, &req.bytes, &req.content_type)
            .await?;

        let mut variants = VariantMap::new();
        for encoded in &processed.variants {
            let path = variant_path(&storage_path, &encoded.name, processed.variant_ext);
            let url = self
                .store
                .put(&path, &encoded.bytes, processed.variant_content_type)
                .await?;
            variants.insert(
                encoded.name.clone(),
                MediaVariant {
                    url,
                    path,
                    width: encoded.width,
                    height: encoded.height,
                    size_bytes: encoded.bytes.len() as i64,
                },
            );
        }

        // Largest produced variant wins; audio/documents (and images too
        // small for any target) fall back to the original upload.
        let main_url = variants
            .values()
            .max_by_key(|v| v.width)
            .map(|v| v.url.clone())
            .unwrap_or(original_url);

        let asset = self
            .catalog
            .insert(NewMediaAsset {
                id,
                original_filename: req.original_filename,
                display_filename,
                content_type: req.content_type,
                kind,
                size_bytes: req.bytes.len() as i64,
                storage_path,
                main_url,
                width: processed.width,
                height: processed.height,
                placeholder: processed.placeholder,
                dominant_color: processed.dominant_color,
                content_hash: processed.content_hash,
                variants,
                alt_text: req.alt_text,
            })
            .await?;

        info!(
            subsystem = "ingest",
            component = "orchestrator",
            op = "upload",
            asset_id = %asset.id,
            kind = %asset.kind,
            size_bytes = asset.size_bytes,
            variant_count = asset.variants.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload complete"
        );
        Ok(asset)
    }

    /// Run the kind-specific processing path.
    async fn process(&self, kind: MediaKind, req: &UploadRequest) -> Result<ProcessedMedia> {
        match kind {
            // SVG is vector; it gets no raster derivatives.
            MediaKind::Image if req.content_type != "image/svg+xml" => {
                let bytes = req.bytes.clone();
                // Decode/resize/encode are CPU-bound; keep them off the
                // async pool.
                let (dims, encoded, summary, hash) =
                    tokio::task::spawn_blocking(move || -> Result<_> {
                        let dims = image_dimensions(&bytes)?;
                        let encoded = image_variants(&bytes, IMAGE_SIZE_TABLE)?;
                        let summary = summarize(&bytes);
                        let hash = compute_content_hash(&bytes);
                        Ok((dims, encoded, summary, hash))
                    })
                    .await
                    .map_err(|e| Error::Internal(format!("processing task: {}", e)))??;

                Ok(ProcessedMedia {
                    width: Some(dims.0 as i32),
                    height: Some(dims.1 as i32),
                    placeholder: Some(summary.placeholder),
                    dominant_color: Some(summary.dominant_color),
                    content_hash: Some(hash),
                    variants: encoded,
                    variant_content_type: "image/jpeg",
                    variant_ext: "jpg",
                })
            }
            MediaKind::Video => {
                let result = atelier_media::video_variants(&req.bytes, VIDEO_TIER_TABLE).await?;
                Ok(ProcessedMedia {
                    width: Some(result.source_width as i32),
                    height: Some(result.source_height as i32),
                    placeholder: None,
                    dominant_color: None,
                    content_hash: Some(compute_content_hash(&req.bytes)),
                    variants: result.variants,
                    variant_content_type: "video/mp4",
                    variant_ext: "mp4",
                })
            }
            // Audio, documents, SVG: original bytes verbatim, no derivatives.
            _ => Ok(ProcessedMedia {
                width: None,
                height: None,
                placeholder: None,
                dominant_color: None,
                content_hash: None,
                variants: Vec::new(),
                variant_content_type: "",
                variant_ext: "",
            }),
        }
    }

    /// Increment the reference count for an asset a content entity attached.
    pub async fn attach(&self, id: Uuid) -> Result<i32> {
        self.catalog.attach(id).await
    }

    /// Decrement the reference count after a detach or entity deletion.
    pub async fn detach(&self, id: Uuid) -> Result<i32> {
        let ref_count = self.catalog.detach(id).await?;
        if ref_count == 0 {
            warn!(
                subsystem = "ingest",
                component = "orchestrator",
                op = "detach",
                asset_id = %id,
                "Asset is now unreferenced"
            );
        }
        Ok(ref_count)
    }
}
