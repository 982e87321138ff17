//! # atelier-storage
//!
//! Object store clients for the atelier media backend. The [`ObjectStore`]
//! trait is the sole I/O boundary to external blob storage; implementations
//! cover a CDN storage zone (production) and the local filesystem
//! (development, tests).

use async_trait::async_trait;

use atelier_core::Result;

pub mod cdn;
pub mod filesystem;
pub mod memory;
pub mod paths;

pub use cdn::{CdnConfig, CdnStore};
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use paths::{date_prefix, object_path, variant_path};

/// Storage backend trait for blob upload/delete.
///
/// `put` returns the public URL the blob is served from. `delete` is
/// idempotent: deleting a non-existent path is not an error.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes to the given path, returning the public URL.
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<String>;

    /// Delete the blob at the given path. Missing paths are a no-op.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check whether a blob exists at the given path.
    async fn exists(&self, path: &str) -> Result<bool>;
}
