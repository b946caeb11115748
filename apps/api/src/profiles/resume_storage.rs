use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;

/// Object storage for uploaded résumés. Only the returned key is persisted.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> anyhow::Result<()>;
}

pub struct S3ResumeStorage {
    client: S3Client,
    bucket: String,
}

impl S3ResumeStorage {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ResumeStorage for S3ResumeStorage {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
