//! CDN storage-zone client.
//!
//! Talks to a Bunny-style storage zone over HTTP: blobs are PUT to
//! `{endpoint}/{zone}/{path}` with an access-key header and served from a
//! pull zone at `{public_base}/{path}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use atelier_core::{Error, Result};

use crate::ObjectStore;

/// Configuration for a CDN storage zone, read from the environment by the
/// API binary (`ATELIER_STORAGE_*`).
#[derive(Debug, Clone)]
pub struct CdnConfig {
    /// Storage API endpoint, e.g. `https://storage.bunnycdn.com`.
    pub endpoint: String,
    /// Storage zone name.
    pub zone: String,
    /// Access key sent with every request.
    pub access_key: String,
    /// Public base URL of the pull zone, e.g. `https://cdn.example.com`.
    pub public_base: String,
}

/// HTTP object store backed by a CDN storage zone.
pub struct CdnStore {
    client: reqwest::Client,
    config: CdnConfig,
}

impl CdnStore {
    pub fn new(config: CdnConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn storage_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.zone,
            path
        )
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.public_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ObjectStore for CdnStore {
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<String> {
        debug!(
            subsystem = "storage",
            component = "cdn",
            op = "put",
            storage_path = path,
            size_bytes = data.len(),
            "Uploading blob"
        );

        let response = self
            .client
            .put(self.storage_url(path))
            .header("AccessKey", &self.config.access_key)
            .header("Content-Type", content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| Error::StorageUploadFailed(format!("put {}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Error::StorageUploadFailed(format!(
                "put {}: status {}",
                path,
                response.status()
            )));
        }

        Ok(self.public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.storage_url(path))
            .header("AccessKey", &self.config.access_key)
            .send()
            .await
            .map_err(|e| Error::Request(format!("delete {}: {}", path, e)))?;

        // Idempotent: a missing blob is already in the desired state.
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            warn!(
                subsystem = "storage",
                component = "cdn",
                op = "delete",
                storage_path = path,
                status = %response.status(),
                "Blob delete returned non-success status"
            );
            return Err(Error::Request(format!(
                "delete {}: status {}",
                path,
                response.status()
            )));
        }

        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let response = self
            .client
            .head(self.storage_url(path))
            .header("AccessKey", &self.config.access_key)
            .send()
            .await
            .map_err(|e| Error::Request(format!("head {}: {}", path, e)))?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CdnStore {
        CdnStore::new(CdnConfig {
            endpoint: "https://storage.example.net/".to_string(),
            zone: "atelier".to_string(),
            access_key: "key".to_string(),
            public_base: "https://cdn.example.com/".to_string(),
        })
    }

    #[test]
    fn test_storage_url_strips_trailing_slash() {
        assert_eq!(
            store().storage_url("media/2026/08/a.jpg"),
            "https://storage.example.net/atelier/media/2026/08/a.jpg"
        );
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            store().public_url("media/2026/08/a.jpg"),
            "https://cdn.example.com/media/2026/08/a.jpg"
        );
    }
}
