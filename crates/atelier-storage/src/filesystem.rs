//! Filesystem object store for development and tests.
//!
//! Blobs live under a base directory mirroring their storage paths and are
//! served by whatever static file server fronts that directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use atelier_core::{Error, Result};

use crate::ObjectStore;

/// Object store writing into a local directory tree.
pub struct FilesystemStore {
    base_path: PathBuf,
    /// Public base URL prepended to storage paths in returned URLs.
    public_base: String,
}

impl FilesystemStore {
    pub fn new(base_path: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base: public_base.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), path)
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permissions, missing mounts) before the first upload does.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn put(&self, path: &str, data: &[u8], _content_type: &str) -> Result<String> {
        let full_path = self.full_path(path);
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "put",
            storage_path = path,
            size_bytes = data.len(),
            "Writing blob"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "create_dir_all failed");
                Error::StorageUploadFailed(format!("create_dir_all: {}", e))
            })?;
        }

        // Atomic write: temp file + rename. The temp name carries a unique
        // suffix so concurrent puts sharing a stem (a.jpg, a.png) never
        // collide before the rename.
        let temp_path = full_path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::StorageUploadFailed(format!("create {}: {}", path, e)))?;
        file.write_all(data)
            .await
            .map_err(|e| Error::StorageUploadFailed(format!("write {}: {}", path, e)))?;
        file.sync_all()
            .await
            .map_err(|e| Error::StorageUploadFailed(format!("sync {}: {}", path, e)))?;
        drop(file);

        fs::rename(&temp_path, &full_path)
            .await
            .map_err(|e| Error::StorageUploadFailed(format!("rename {}: {}", path, e)))?;

        // 0644: readable by the static file server, never executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(self.public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(path)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> FilesystemStore {
        FilesystemStore::new(dir.path(), "http://localhost:8080/files")
    }

    #[tokio::test]
    async fn test_put_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let url = store
            .put("media/2026/08/a.jpg", b"bytes", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/files/media/2026/08/a.jpg");
        let on_disk = std::fs::read(dir.path().join("media/2026/08/a.jpg")).unwrap();
        assert_eq!(on_disk, b"bytes");
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.put("x/y.bin", b"data", "application/octet-stream").await.unwrap();
        assert!(store.exists("x/y.bin").await.unwrap());
        store.delete("x/y.bin").await.unwrap();
        assert!(!store.exists("x/y.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_path_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.delete("never/existed.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        store(&dir).validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_puts_with_shared_stem() {
        // a.jpg and a.png would collide on a single stem-derived temp name;
        // unique temp suffixes keep simultaneous writes independent.
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let (jpg, png) = tokio::join!(
            store.put("m/a.jpg", b"jpeg-bytes", "image/jpeg"),
            store.put("m/a.png", b"png-bytes", "image/png"),
        );
        jpg.unwrap();
        png.unwrap();
        assert_eq!(std::fs::read(dir.path().join("m/a.jpg")).unwrap(), b"jpeg-bytes");
        assert_eq!(std::fs::read(dir.path().join("m/a.png")).unwrap(), b"png-bytes");
        // No stray temp files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("m"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.put("a.bin", b"one", "application/octet-stream").await.unwrap();
        store.put("a.bin", b"two", "application/octet-stream").await.unwrap();
        let on_disk = std::fs::read(dir.path().join("a.bin")).unwrap();
        assert_eq!(on_disk, b"two");
    }
}
