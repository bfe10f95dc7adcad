//! Object storage for uploaded originals and converted PDFs.

pub mod memory;
pub mod s3;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};

pub use memory::MemoryStorage;
pub use s3::S3Storage;

pub const UPLOAD_PREFIX: &str = "uploads";
pub const CONVERTED_PREFIX: &str = "converted_pdfs";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads the file at `path` under `key`.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), StorageError>;

    /// Succeeds when `key` exists.
    async fn head(&self, key: &str) -> Result<(), StorageError>;

    /// A GET URL for `key` that stops working after `ttl`.
    async fn presigned_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}

pub type SharedStorage = Arc<dyn ObjectStorage>;

pub fn upload_key(file_id: Uuid) -> String {
    format!("{UPLOAD_PREFIX}/{file_id}.docx")
}

pub fn converted_key(file_id: Uuid) -> String {
    format!("{CONVERTED_PREFIX}/{file_id}.pdf")
}

pub async fn from_config(config: &StorageConfig) -> SharedStorage {
    match &config.backend {
        StorageBackend::S3 { bucket } => {
            tracing::info!("Using S3 bucket '{bucket}'");
            Arc::new(S3Storage::from_env(bucket).await)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage; files are lost on restart");
            Arc::new(MemoryStorage::new("local"))
        }
    }
}
