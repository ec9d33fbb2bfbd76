//! Object storage layer
//!
//! This module provides the bucket abstraction behind the media proxy and
//! upload paths. Two backends are supported:
//! - Local filesystem (default, keeps development and tests hermetic)
//! - S3-compatible bucket via the AWS SDK
//!
//! The backend is selected based on configuration.

pub mod filesystem;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageConfig, StorageDriver};

pub use filesystem::FilesystemStore;
pub use s3::S3Store;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Metadata about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time (if available).
    pub last_modified: Option<DateTime<Utc>>,
    /// Content type (if available).
    pub content_type: Option<String>,
}

/// Object store abstraction for media content.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's metadata without fetching content.
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Get an object's content in full.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Get an object as a byte stream.
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Put an object.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the name of this storage backend ("s3", "filesystem").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends
    /// that don't require connectivity verification.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Create an object store based on configuration.
pub async fn create_store(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.driver {
        StorageDriver::Filesystem => {
            let store = FilesystemStore::new(&config.root)?;
            Ok(Arc::new(store))
        }
        StorageDriver::S3 => {
            if config.bucket.is_empty() {
                return Err(StorageError::Config(
                    "S3 storage requires a bucket name. Set 'storage.bucket' in config.yml or AIRWAVE_STORAGE_BUCKET."
                        .to_string(),
                ));
            }
            let store = S3Store::new(
                &config.bucket,
                &config.region,
                config.endpoint.as_deref(),
                config.prefix.as_deref(),
                config.force_path_style,
            )
            .await;
            Ok(Arc::new(store))
        }
    }
}

/// Legacy route prefix still present in keys stored by the old site.
const LEGACY_KEY_PREFIX: &str = "api/podcast/";

/// Normalize a client-supplied object key.
///
/// - An absolute URL is reduced to its path component
/// - The legacy `api/podcast/` route prefix is stripped
/// - Leading slashes are stripped
///
/// Normalization is idempotent: feeding the output back in yields the
/// same key.
pub fn normalize_key(raw: &str) -> String {
    let mut key = raw.trim().to_string();

    if key.starts_with("http://") || key.starts_with("https://") {
        if let Ok(parsed) = url::Url::parse(&key) {
            key = parsed.path().to_string();
        }
    }

    let mut key = key.trim_start_matches('/');
    while let Some(stripped) = key.strip_prefix(LEGACY_KEY_PREFIX) {
        key = stripped.trim_start_matches('/');
    }

    key.to_string()
}

/// Infer a Content-Type from an object key's extension.
///
/// Falls back to `application/octet-stream` for unknown extensions.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = key
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_plain() {
        assert_eq!(normalize_key("podcasts/a.mp3"), "podcasts/a.mp3");
    }

    #[test]
    fn test_normalize_key_absolute_url() {
        assert_eq!(
            normalize_key("https://host/api/podcast/podcasts/a.mp3"),
            "podcasts/a.mp3"
        );
    }

    #[test]
    fn test_normalize_key_strips_legacy_prefix() {
        assert_eq!(normalize_key("api/podcast/covers/b.png"), "covers/b.png");
    }

    #[test]
    fn test_normalize_key_strips_leading_slash() {
        assert_eq!(normalize_key("/podcasts/a.mp3"), "podcasts/a.mp3");
        assert_eq!(normalize_key("//podcasts/a.mp3"), "podcasts/a.mp3");
    }

    #[test]
    fn test_normalize_key_url_with_query() {
        assert_eq!(
            normalize_key("https://host/podcasts/a.mp3?token=abc"),
            "podcasts/a.mp3"
        );
    }

    #[test]
    fn test_normalize_key_is_idempotent() {
        let inputs = [
            "https://host/api/podcast/podcasts/a.mp3",
            "/api/podcast/images/x.png",
            "api/podcast/api/podcast/y.mp3",
            "plain/key.jpg",
        ];
        for input in inputs {
            let once = normalize_key(input);
            let twice = normalize_key(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("podcasts/a.mp3"), "audio/mpeg");
        assert_eq!(content_type_for_key("covers/B.PNG"), "image/png");
        assert_eq!(content_type_for_key("unknown.bin"), "application/octet-stream");
        assert_eq!(content_type_for_key("no-extension"), "application/octet-stream");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn key_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            // Plain keys
            "[a-z0-9]{1,8}(/[a-z0-9]{1,8}){0,3}\\.(mp3|png|jpg)",
            // Leading slashes
            "/{1,3}[a-z0-9]{1,8}/[a-z0-9]{1,8}\\.mp3",
            // Legacy prefix
            "[a-z0-9]{1,8}\\.mp3".prop_map(|k| format!("api/podcast/{}", k)),
            // Absolute URLs
            "[a-z0-9]{1,8}/[a-z0-9]{1,8}\\.mp3"
                .prop_map(|k| format!("https://cdn.example.edu/api/podcast/{}", k)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Normalization is idempotent for any client-supplied key shape.
        #[test]
        fn normalize_key_idempotent(raw in key_strategy()) {
            let once = normalize_key(&raw);
            let twice = normalize_key(&once);
            prop_assert_eq!(once, twice);
        }

        /// Normalized keys never start with a slash or the legacy prefix.
        #[test]
        fn normalize_key_canonical_shape(raw in key_strategy()) {
            let key = normalize_key(&raw);
            prop_assert!(!key.starts_with('/'));
            prop_assert!(!key.starts_with("api/podcast/"));
        }
    }
}
