//! Evidence blob storage
//!
//! Blobs are addressed by a relative path chosen by the engine
//! (`inspecciones/<dd-mm-yyyy>/<inspection uuid>/<photo uuid>.jpg`). The
//! filesystem store resolves those paths under a configured root.

use crate::error::{BlobError, BlobResult};
use async_trait::async_trait;
use inspection_types::ContentHash;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// SHA-256 of `bytes` as lowercase hex
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentHash::from_hex(hex::encode(hasher.finalize()))
}

/// Storage for evidence payloads
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `path`, replacing any existing blob
    async fn put(&self, path: &str, bytes: &[u8]) -> BlobResult<()>;

    /// Read a blob; `None` if it does not exist
    async fn get(&self, path: &str) -> BlobResult<Option<Vec<u8>>>;

    /// Delete a blob; `false` if it did not exist
    async fn delete(&self, path: &str) -> BlobResult<bool>;
}

/// Reject absolute paths and anything that climbs out of the root
fn validate_relative(path: &str) -> BlobResult<&Path> {
    let rel = Path::new(path);
    let clean = !path.is_empty()
        && rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if clean {
        Ok(rel)
    } else {
        Err(BlobError::InvalidPath(path.to_string()))
    }
}

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> BlobResult<PathBuf> {
        Ok(self.root.join(validate_relative(path)?))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> BlobResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        debug!(path = %full.display(), size = bytes.len(), "Blob written");
        Ok(())
    }

    async fn get(&self, path: &str) -> BlobResult<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> BlobResult<bool> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                debug!(path = %full.display(), "Blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory blob store for development and testing
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> BlobResult<()> {
        validate_relative(path)?;
        self.blobs
            .write()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> BlobResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(path).cloned())
    }

    async fn delete(&self, path: &str) -> BlobResult<bool> {
        Ok(self.blobs.write().await.remove(path).is_some())
    }
}
