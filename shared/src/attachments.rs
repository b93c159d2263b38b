use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use crate::error::TodoError;

/// Binary attachments, stored under the todo id as object key.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Time-limited URL allowing a single direct `PUT` of `object_key`.
    async fn upload_url(&self, object_key: &str) -> Result<String, TodoError>;

    /// Idempotent.
    async fn delete_object(&self, object_key: &str) -> Result<(), TodoError>;

    /// URL recorded on the item once an upload has been authorized.
    fn public_url(&self, object_key: &str) -> String;
}

/// Public URL of an object in a virtual-hosted S3 bucket.
pub fn attachment_url(bucket: &str, object_key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, object_key)
}

pub struct S3AttachmentStore {
    client: S3Client,
    bucket: String,
    url_expiration: Duration,
}

impl S3AttachmentStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, url_expiration_secs: u64) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            url_expiration: Duration::from_secs(url_expiration_secs),
        }
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    async fn upload_url(&self, object_key: &str) -> Result<String, TodoError> {
        tracing::info!(object_key = %object_key, "Getting signed upload url");

        let presigning = PresigningConfig::expires_in(self.url_expiration).map_err(|e| {
            TodoError::StoreUnavailable(format!("Invalid presigning config: {}", e))
        })?;

        let presigned_request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                let message = format!(
                    "Failed to generate presigned URL: {}",
                    DisplayErrorContext(e)
                );
                tracing::error!("{}", message);
                TodoError::StoreUnavailable(message)
            })?;

        Ok(presigned_request.uri().to_string())
    }

    async fn delete_object(&self, object_key: &str) -> Result<(), TodoError> {
        tracing::info!(object_key = %object_key, "Deleting todo attachment");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await
            .map_err(|e| {
                let message = format!("Failed to delete from S3: {}", DisplayErrorContext(e));
                tracing::error!("{}", message);
                TodoError::StoreUnavailable(message)
            })?;

        Ok(())
    }

    fn public_url(&self, object_key: &str) -> String {
        attachment_url(&self.bucket, object_key)
    }
}
