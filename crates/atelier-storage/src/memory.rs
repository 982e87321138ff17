//! In-memory object store used by tests and offline development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use atelier_core::{Error, Result};

use crate::ObjectStore;

/// Object store keeping blobs in a process-local map.
///
/// `fail_puts` makes every `put` fail, for exercising the orchestrator's
/// abort-without-catalog-row guarantee.
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    public_base: String,
    fail_puts: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            public_base: "https://cdn.test".to_string(),
            fail_puts: false,
        }
    }

    /// A store whose every upload fails with `StorageUploadFailed`.
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Self::new()
        }
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Fetch a stored blob by path.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, path: &str, data: &[u8], _content_type: &str) -> Result<String> {
        if self.fail_puts {
            return Err(Error::StorageUploadFailed(format!(
                "put {}: simulated failure",
                path
            )));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(format!("{}/{}", self.public_base, path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }
}
