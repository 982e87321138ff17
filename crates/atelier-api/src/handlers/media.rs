//! Media asset endpoints: upload, catalog queries, reference counts,
//! deletion.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use atelier_core::defaults::{PAGE_LIMIT, PAGE_LIMIT_MAX};
use atelier_core::{ListMediaRequest, MediaCatalog, MediaKind};
use atelier_ingest::UploadRequest;

use crate::error::ApiError;
use crate::AppState;

/// Upload one file as `multipart/form-data`.
///
/// Expects a `file` field (the upload) and an optional `alt_text` field.
/// Returns the full asset row, every URL in it already live on the object
/// store.
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut original_filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut alt_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                original_filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::BadRequest(format!("Failed to read file data: {}", e))
                        })?
                        .to_vec(),
                );
            }
            Some("alt_text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read alt_text: {}", e)))?;
                if !text.trim().is_empty() {
                    alt_text = Some(text);
                }
            }
            _ => {}
        }
    }

    let bytes = bytes
        .ok_or_else(|| ApiError::BadRequest("No file uploaded. Use field name 'file'.".into()))?;
    let original_filename = original_filename
        .ok_or_else(|| ApiError::BadRequest("Upload is missing a filename".into()))?;
    let content_type = content_type
        .ok_or_else(|| ApiError::BadRequest("Upload is missing a content type".into()))?;

    let asset = state
        .media
        .upload(UploadRequest {
            bytes,
            original_filename,
            content_type,
            alt_text,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

#[derive(Debug, Deserialize)]
pub struct ListMediaQuery {
    /// Filter by kind: `image`, `video`, `audio`, `document`.
    pub kind: Option<String>,
    /// Filename substring search.
    pub search: Option<String>,
    /// Only unreferenced assets.
    #[serde(default)]
    pub unused_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListMediaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = query
        .kind
        .as_deref()
        .map(|k| {
            k.parse::<MediaKind>()
                .map_err(|_| ApiError::BadRequest(format!("Unknown media kind: {}", k)))
        })
        .transpose()?;

    let limit = query
        .limit
        .unwrap_or(PAGE_LIMIT)
        .clamp(1, PAGE_LIMIT_MAX);
    let offset = query.offset.unwrap_or(0).max(0);

    let response = state
        .db
        .media
        .list(ListMediaRequest {
            kind,
            search: query.search,
            unused_only: query.unused_only,
            limit: Some(limit),
            offset: Some(offset),
        })
        .await?;

    Ok(Json(response))
}

pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state.db.media.get(id).await?;
    Ok(Json(asset))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMediaRequest {
    /// New alt text; `null` clears it.
    pub alt_text: Option<String>,
}

pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .media
        .update_alt_text(id, body.alt_text.as_deref())
        .await?;
    let asset = state.db.media.get(id).await?;
    Ok(Json(asset))
}

pub async fn attach_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ref_count = state.media.attach(id).await?;
    Ok(Json(serde_json::json!({ "id": id, "ref_count": ref_count })))
}

pub async fn detach_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ref_count = state.media.detach(id).await?;
    Ok(Json(serde_json::json!({ "id": id, "ref_count": ref_count })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteMediaQuery {
    /// Delete even when the asset is still referenced.
    #[serde(default)]
    pub force: bool,
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteMediaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.media.delete(id, query.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    /// Minimum soft-delete age before physical reclamation.
    pub min_age_hours: Option<i32>,
}

pub async fn cleanup_media(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .media
        .cleanup_soft_deleted(query.min_age_hours.unwrap_or(24))
        .await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

pub async fn soft_delete_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.media.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.media.restore(id).await?;
    let asset = state.db.media.get(id).await?;
    Ok(Json(asset))
}
