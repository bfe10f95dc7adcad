use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;

use super::{ObjectStorage, StorageError};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Bytes,
}

/// Process-local object store for development and tests.
///
/// Signed URLs use a `memory://` scheme and are only meaningful to code that
/// holds the same store.
pub struct MemoryStorage {
    bucket: String,
    objects: DashMap<String, StoredObject>,
}

impl MemoryStorage {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|o| o.value().clone())
    }

    pub fn remove(&self, key: &str) -> Option<StoredObject> {
        self.objects.remove(key).map(|(_, o)| o)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), StorageError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to read {}: {e}", path.display())))?;

        self.objects.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data: Bytes::from(data),
            },
        );
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<(), StorageError> {
        if self.objects.contains_key(key) {
            Ok(())
        } else {
            Err(StorageError::NotFound(key.to_string()))
        }
    }

    async fn presigned_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("memory://{}/{key}?expires={expires}", self.bucket))
    }
}
