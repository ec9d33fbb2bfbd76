//! Local filesystem storage backend.

use crate::storage::{ByteStream, ObjectMeta, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Filesystem-backed object store rooted at a media directory.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Create a new filesystem store, creating the root directory if needed.
    pub fn new(root: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Resolve a key to a path under the root, rejecting traversal.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
        }
        Ok(self.root.join(key))
    }
}

impl std::fmt::Debug for FilesystemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemStore")
            .field("root", &self.root)
            .finish()
    }
}

fn map_io_error(e: std::io::Error, key: &str) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.key_path(key)?;
        let meta = fs::metadata(&path).await.map_err(|e| map_io_error(e, key))?;

        let last_modified = meta
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(ObjectMeta {
            size: meta.len(),
            last_modified,
            content_type: None,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(key)?;
        let data = fs::read(&path).await.map_err(|e| map_io_error(e, key))?;
        Ok(Bytes::from(data))
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let path = self.key_path(key)?;
        let file = fs::File::open(&path).await.map_err(|e| map_io_error(e, key))?;

        let stream = ReaderStream::new(file).map(|result| result.map_err(StorageError::Io));
        Ok(Box::pin(stream))
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp sibling and rename so readers never see a partial file
        let tmp = path.with_extension("tmp-write");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&data).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        fs::remove_file(&path).await.map_err(|e| map_io_error(e, key))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, FilesystemStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FilesystemStore::new(dir.path()).expect("Failed to create store");
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (_dir, store) = test_store();

        store
            .put("podcasts/ep1.mp3", Bytes::from_static(b"audio-bytes"))
            .await
            .expect("Failed to put");

        let data = store.get("podcasts/ep1.mp3").await.expect("Failed to get");
        assert_eq!(&data[..], b"audio-bytes");
        assert!(store.exists("podcasts/ep1.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = test_store();
        let err = store.get("missing.mp3").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_head() {
        let (_dir, store) = test_store();
        store
            .put("covers/a.png", Bytes::from_static(b"0123456789"))
            .await
            .unwrap();

        let meta = store.head("covers/a.png").await.unwrap();
        assert_eq!(meta.size, 10);
    }

    #[tokio::test]
    async fn test_get_stream_yields_full_content() {
        let (_dir, store) = test_store();
        let payload = vec![7u8; 128 * 1024];
        store.put("big.bin", Bytes::from(payload.clone())).await.unwrap();

        let mut stream = store.get_stream("big.bin").await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, payload);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, store) = test_store();
        store.put("gone.txt", Bytes::from_static(b"x")).await.unwrap();
        store.delete("gone.txt").await.unwrap();
        assert!(!store.exists("gone.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, store) = test_store();
        let err = store.get("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
