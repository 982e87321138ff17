//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::error;

use atelier_core::Error;

/// API-level error, produced by handlers and converted from core errors.
#[derive(Debug)]
pub enum ApiError {
    /// 413, upload exceeds the size limit.
    PayloadTooLarge(String),
    /// 415, type not on the allow-list.
    UnsupportedMediaType(String),
    /// 404.
    NotFound(String),
    /// 409, asset still referenced; carries the live count.
    Conflict { message: String, ref_count: i32 },
    /// 400.
    BadRequest(String),
    /// 500, anything the client cannot act on.
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::FileTooLarge { size, max } => ApiError::PayloadTooLarge(format!(
                "File is {} bytes, limit is {} bytes",
                size, max
            )),
            Error::UnsupportedType(msg) => ApiError::UnsupportedMediaType(msg),
            Error::AssetNotFound(id) => ApiError::NotFound(format!("Asset {} not found", id)),
            Error::AssetInUse { ref_count } => ApiError::Conflict {
                message: format!("Asset is referenced by {} content entities", ref_count),
                ref_count,
            },
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::Conflict { message, ref_count } => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": message, "ref_count": ref_count }),
            ),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Internal(err) => {
                // The detailed failure (ffmpeg stderr, storage paths) is for
                // the server log only; the client gets a generic message.
                error!(
                    subsystem = "api",
                    component = "error",
                    error = %err,
                    "Request failed with internal error"
                );
                let message = match err {
                    Error::TranscodeFailed(_) | Error::StorageUploadFailed(_) => "Upload failed",
                    _ => "Internal server error",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": message }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_body_is_generic() {
        let (status, body) = body_json(ApiError::Internal(Error::TranscodeFailed(
            "ffmpeg tier 720p exited with 1: /tmp/work/source.bin".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");

        let (status, body) = body_json(ApiError::Internal(Error::StorageUploadFailed(
            "put media/2026/08/x.jpg: status 503".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");

        let (_, body) = body_json(ApiError::Internal(Error::Internal(
            "pool exhausted at pg://user@host".to_string(),
        )))
        .await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_conflict_body_carries_ref_count() {
        let (status, body) = body_json(Error::AssetInUse { ref_count: 2 }.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["ref_count"], 2);
    }

    #[test]
    fn test_core_error_mapping() {
        let e: ApiError = Error::FileTooLarge { size: 10, max: 5 }.into();
        assert!(matches!(e, ApiError::PayloadTooLarge(_)));

        let e: ApiError = Error::UnsupportedType("application/zip".into()).into();
        assert!(matches!(e, ApiError::UnsupportedMediaType(_)));

        let e: ApiError = Error::AssetNotFound(Uuid::nil()).into();
        assert!(matches!(e, ApiError::NotFound(_)));

        let e: ApiError = Error::AssetInUse { ref_count: 3 }.into();
        assert!(matches!(e, ApiError::Conflict { ref_count: 3, .. }));

        let e: ApiError = Error::TranscodeFailed("boom".into()).into();
        assert!(matches!(e, ApiError::Internal(_)));
    }
}
