//! Core traits for atelier abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The Postgres
//! catalog lives in `atelier-db`; tests use in-memory implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{MediaAsset, MediaKind, NewMediaAsset};

/// Request for listing media assets.
#[derive(Debug, Clone, Default)]
pub struct ListMediaRequest {
    /// Filter by media kind.
    pub kind: Option<MediaKind>,
    /// Free-text search over original and display filenames.
    pub search: Option<String>,
    /// Only assets with `ref_count == 0` (cleanup workflows).
    pub unused_only: bool,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// Response for listing media assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMediaResponse {
    pub assets: Vec<MediaAsset>,
    pub total: i64,
}

/// The system of record for media assets.
///
/// One row per logical asset, with an embedded variant map and a reference
/// count tracking how many content entities use it. List/query operations
/// exclude soft-deleted rows.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Insert a new asset row. Called exactly once per successful upload,
    /// after every blob is live on the object store.
    async fn insert(&self, asset: NewMediaAsset) -> Result<MediaAsset>;

    /// Fetch an asset by id. Soft-deleted rows are not returned.
    async fn get(&self, id: Uuid) -> Result<MediaAsset>;

    /// List assets with filtering and pagination.
    async fn list(&self, req: ListMediaRequest) -> Result<ListMediaResponse>;

    /// Update the alt text, the only operator-editable metadata field.
    async fn update_alt_text(&self, id: Uuid, alt_text: Option<&str>) -> Result<()>;

    /// Increment the reference count by one. Returns the new count.
    ///
    /// Implementations must issue a single atomic update-in-place, not a
    /// read-then-write, so concurrent attaches never lose updates.
    async fn attach(&self, id: Uuid) -> Result<i32>;

    /// Decrement the reference count by one, floored at zero. Returns the
    /// new count. The floor guards against double-detach bugs in callers;
    /// underflow is clamped, not reported.
    async fn detach(&self, id: Uuid) -> Result<i32>;

    /// Remove the catalog row, returning it so the caller can delete blobs.
    ///
    /// The reference count is re-checked at delete time inside the same
    /// transaction as the row removal: a row that gained a reference since
    /// the delete was requested fails with `AssetInUse` unless `force`.
    async fn remove(&self, id: Uuid, force: bool) -> Result<MediaAsset>;

    /// Stamp the deletion timestamp without removing the row or blobs.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    /// Clear the deletion timestamp on a soft-deleted row.
    async fn restore(&self, id: Uuid) -> Result<()>;

    /// Unreferenced soft-deleted assets older than the given age, eligible
    /// for physical cleanup.
    async fn list_cleanup_candidates(&self, min_age_hours: i32) -> Result<Vec<MediaAsset>>;
}
