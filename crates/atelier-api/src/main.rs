//! atelier-api - HTTP API server for the atelier media backend

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use atelier_core::defaults::MAX_UPLOAD_BYTES;
use atelier_core::MediaCatalog;
use atelier_db::Database;
use atelier_ingest::{MediaService, UploadConfig};
use atelier_storage::{CdnConfig, CdnStore, FilesystemStore, ObjectStore};

use handlers::media::{
    attach_media, cleanup_media, delete_media, detach_media, get_media, list_media,
    restore_media, soft_delete_media, update_media, upload_media,
};
use handlers::system::health;

pub use error::ApiError;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs, so IDs sort
/// chronologically in logs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE AND CONFIGURATION
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub media: Arc<MediaService>,
}

/// Parse allowed CORS origins from `CORS_ALLOWED_ORIGINS` (comma-separated).
/// Defaults to local development origins.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let raw = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());
    raw.split(',')
        .filter_map(|origin| {
            let origin = origin.trim();
            if origin.is_empty() {
                return None;
            }
            match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect()
}

/// Build the object store from the environment.
///
/// `STORAGE_BACKEND=cdn` selects the CDN storage zone and requires the
/// `ATELIER_STORAGE_*` variables; anything else uses the local filesystem
/// store rooted at `FILE_STORAGE_PATH`.
async fn build_store() -> anyhow::Result<Arc<dyn ObjectStore>> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "filesystem".to_string());
    match backend.as_str() {
        "cdn" => {
            let require = |name: &str| -> anyhow::Result<String> {
                std::env::var(name)
                    .map_err(|_| anyhow::anyhow!("{} is required for STORAGE_BACKEND=cdn", name))
            };
            let config = CdnConfig {
                endpoint: require("ATELIER_STORAGE_ENDPOINT")?,
                zone: require("ATELIER_STORAGE_ZONE")?,
                access_key: require("ATELIER_STORAGE_ACCESS_KEY")?,
                public_base: require("ATELIER_STORAGE_PUBLIC_BASE")?,
            };
            info!(zone = %config.zone, "Using CDN object store");
            Ok(Arc::new(CdnStore::new(config)))
        }
        _ => {
            let path = std::env::var("FILE_STORAGE_PATH")
                .unwrap_or_else(|_| "/var/lib/atelier/media".to_string());
            let public_base = std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".to_string());
            info!(path = %path, "Using filesystem object store");
            let store = FilesystemStore::new(path, public_base);
            store
                .validate()
                .await
                .map_err(|e| anyhow::anyhow!("storage health check failed: {}", e))?;
            Ok(Arc::new(store))
        }
    }
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default filter.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atelier_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/atelier".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let max_upload_bytes: usize = std::env::var("ATELIER_MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(MAX_UPLOAD_BYTES);

    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let store = build_store().await?;

    let catalog: Arc<dyn MediaCatalog> = Arc::new(db.media.clone());
    let media = Arc::new(MediaService::new(
        catalog,
        store,
        UploadConfig { max_upload_bytes },
    ));

    let state = AppState { db, media };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/media", post(upload_media).get(list_media))
        .route("/api/v1/media/cleanup", post(cleanup_media))
        .route(
            "/api/v1/media/:id",
            get(get_media).patch(update_media).delete(delete_media),
        )
        .route("/api/v1/media/:id/attach", post(attach_media))
        .route("/api/v1/media/:id/detach", post(detach_media))
        .route("/api/v1/media/:id/soft-delete", post(soft_delete_media))
        .route("/api/v1/media/:id/restore", post(restore_media))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        // Headroom above the file limit for multipart framing.
        .layer(RequestBodyLimitLayer::new(max_upload_bytes + 1024 * 1024))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
