use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{info, warn};
use uuid::Uuid;

use crate::export::assemble::ExportDocument;

/// Object key for an archived export.
pub fn archive_key(user_id: Uuid, resume_id: Uuid, file_name: &str) -> String {
    format!("exports/{user_id}/{resume_id}/{file_name}")
}

/// Keeps a copy of every exported document.
///
/// Carried in `AppState` as `Arc<dyn ExportArchive>`.
#[async_trait]
pub trait ExportArchive: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
}

pub struct S3Archive {
    client: S3Client,
    bucket: String,
}

impl S3Archive {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        S3Archive {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ExportArchive for S3Archive {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Archived export to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// Archives `doc`. Failures are logged and swallowed: the download must not
/// depend on the archive being reachable.
pub async fn archive_export(
    archive: &dyn ExportArchive,
    user_id: Uuid,
    resume_id: Uuid,
    doc: &ExportDocument,
) -> bool {
    let key = archive_key(user_id, resume_id, &doc.file_name);
    match archive.put(&key, doc.bytes.clone()).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not archive export {key}: {e}");
            false
        }
    }
}
