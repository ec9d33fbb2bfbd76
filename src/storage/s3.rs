//! S3-compatible storage backend using the AWS SDK.

use crate::storage::{
    content_type_for_key, ByteStream, ObjectMeta, ObjectStore, StorageError, StorageResult,
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::DateTime;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

/// S3-compatible object store.
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    /// Create a new S3 store.
    ///
    /// # Arguments
    /// * `force_path_style` - Use path-style URLs (`endpoint/bucket/key`)
    ///   instead of virtual-hosted style. Required for MinIO and some
    ///   S3-compatible services.
    pub async fn new(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        prefix: Option<&str>,
        force_path_style: bool,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(force_path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.to_string(),
            prefix: prefix
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
        }
    }

    /// Apply the configured prefix to a key.
    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn map_get_error(err: SdkError<GetObjectError>, key: &str) -> StorageError {
        let service_err = err.into_service_error();
        if service_err.is_no_such_key() {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::S3(Box::new(service_err))
        }
    }

    fn map_head_error(err: SdkError<HeadObjectError>, key: &str) -> StorageError {
        let service_err = err.into_service_error();
        if service_err.is_not_found() {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::S3(Box::new(service_err))
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.head(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_head_error(e, key))?;

        let last_modified = output
            .last_modified()
            .and_then(|dt| DateTime::from_timestamp(dt.secs(), 0));

        Ok(ObjectMeta {
            size: output.content_length().unwrap_or(0) as u64,
            last_modified,
            content_type: output.content_type().map(|s| s.to_string()),
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_get_error(e, key))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(Box::new(e)))?;
        Ok(data.into_bytes())
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_get_error(e, key))?;

        // Convert the AWS byte stream to AsyncRead, then wrap with
        // ReaderStream for true streaming without buffering the object
        let async_read = output.body.into_async_read();
        let stream = ReaderStream::new(async_read).map(|result| result.map_err(StorageError::Io));

        Ok(Box::pin(stream))
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .content_type(content_type_for_key(key))
            .body(aws_sdk_s3::primitives::ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::S3(Box::new(e.into_service_error())))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| StorageError::S3(Box::new(e.into_service_error())))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::Config(format!(
                    "S3 bucket '{}' is not reachable: {}",
                    self.bucket,
                    e.into_service_error()
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_key_with_prefix() {
        let store = S3Store::new("bucket", "us-east-1", None, Some("/media/"), false).await;
        assert_eq!(store.full_key("podcasts/a.mp3"), "media/podcasts/a.mp3");
    }

    #[tokio::test]
    async fn test_full_key_without_prefix() {
        let store = S3Store::new("bucket", "us-east-1", None, None, false).await;
        assert_eq!(store.full_key("podcasts/a.mp3"), "podcasts/a.mp3");
    }

    #[tokio::test]
    async fn test_empty_prefix_is_dropped() {
        let store = S3Store::new("bucket", "us-east-1", None, Some(""), false).await;
        assert_eq!(store.full_key("x"), "x");
    }
}
