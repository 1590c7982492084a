//! Blob store adapters.
//!
//! [`LocalBlobStore`] writes uploads below a directory that the HTTP server
//! also serves at `/uploads`, so the returned URL is immediately retrievable.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BlobError, BlobStore};

/// URL prefix under which the local upload directory is served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Reject paths that are empty, absolute, or contain `.`/`..` segments.
fn validate_path(path: &str) -> Result<&Path, BlobError> {
    let candidate = Path::new(path);
    let mut components = candidate.components().peekable();
    if components.peek().is_none() {
        return Err(BlobError::InvalidPath(path.to_owned()));
    }
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Ok(candidate)
    } else {
        Err(BlobError::InvalidPath(path.to_owned()))
    }
}

/// Stores blobs as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    /// Create a store writing under `root` whose files are served from
    /// `{base_url}/uploads`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base: format!("{}{UPLOADS_ROUTE}", base_url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        let relative = validate_path(path)?;
        let target = self.root.join(relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        tracing::debug!(path = %target.display(), "Stored upload");
        Ok(format!("{}/{path}", self.public_base))
    }
}

/// Keeps blobs in memory. URLs use the `memory://` scheme.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents stored at `path`, if any.
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(path).cloned()
    }

    /// Number of stored blobs.
    pub async fn count(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        validate_path(path)?;
        self.blobs.write().await.insert(path.to_owned(), bytes);
        Ok(format!("memory://blobs/{path}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("medicines/1700000000000_neem.png").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("medicines/../../secret").is_err());
        assert!(validate_path("./medicines/a.png").is_err());
    }

    #[tokio::test]
    async fn test_local_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "https://devgon.in/");

        let url = store
            .upload("medicines/1_tulsi.jpg", b"jpeg".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "https://devgon.in/uploads/medicines/1_tulsi.jpg");
        let written = std::fs::read(dir.path().join("medicines/1_tulsi.jpg")).unwrap();
        assert_eq!(written, b"jpeg");
    }

    #[tokio::test]
    async fn test_local_upload_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:3000");
        let err = store.upload("../outside", vec![1]).await.unwrap_err();
        assert!(matches!(err, BlobError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_memory_upload() {
        let store = MemoryBlobStore::new();
        let url = store.upload("medicines/2_amla.png", vec![7, 7]).await.unwrap();
        assert_eq!(url, "memory://blobs/medicines/2_amla.png");
        assert_eq!(store.get("medicines/2_amla.png").await, Some(vec![7, 7]));
        assert_eq!(store.count().await, 1);
    }
}
