//! Asset deletion: catalog row removal first, blob deletes best-effort.
//!
//! The catalog removal carries the atomic reference-count guard, so it
//! runs first; blob deletes that fail afterwards leave dangling blobs,
//! which is the lesser problem compared to a catalog row that can never
//! be deleted.

use tracing::{info, warn};
use uuid::Uuid;

use atelier_core::{MediaAsset, Result};

use crate::orchestrator::MediaService;

impl MediaService {
    /// Hard-delete an asset: remove the catalog row (guarded by the
    /// reference count unless `force`), then delete the primary blob and
    /// every variant blob. Individual blob-delete failures are logged and
    /// never resurrect the row.
    pub async fn delete(&self, id: Uuid, force: bool) -> Result<MediaAsset> {
        let asset = self.catalog().remove(id, force).await?;
        self.delete_blobs(&asset).await;

        info!(
            subsystem = "ingest",
            component = "remove",
            op = "delete",
            asset_id = %id,
            force,
            blob_count = asset.all_paths().len(),
            "Asset deleted"
        );
        Ok(asset)
    }

    /// Physically reclaim soft-deleted, unreferenced assets older than the
    /// given age. Returns the number of assets removed.
    pub async fn cleanup_soft_deleted(&self, min_age_hours: i32) -> Result<usize> {
        let candidates = self.catalog().list_cleanup_candidates(min_age_hours).await?;
        let mut removed = 0;
        for asset in candidates {
            match self.catalog().remove(asset.id, false).await {
                Ok(asset) => {
                    self.delete_blobs(&asset).await;
                    removed += 1;
                }
                Err(e) => {
                    // Re-referenced or raced with another cleanup; skip.
                    warn!(
                        subsystem = "ingest",
                        component = "remove",
                        op = "cleanup",
                        asset_id = %asset.id,
                        error = %e,
                        "Skipping cleanup candidate"
                    );
                }
            }
        }

        if removed > 0 {
            info!(
                subsystem = "ingest",
                component = "remove",
                op = "cleanup",
                removed,
                "Soft-deleted assets reclaimed"
            );
        }
        Ok(removed)
    }

    async fn delete_blobs(&self, asset: &MediaAsset) {
        for path in asset.all_paths() {
            if let Err(e) = self.store().delete(path).await {
                warn!(
                    subsystem = "ingest",
                    component = "remove",
                    asset_id = %asset.id,
                    storage_path = path,
                    error = %e,
                    "Blob delete failed, leaving dangling blob"
                );
            }
        }
    }
}
