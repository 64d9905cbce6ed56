//! Object storage for original uploads.
//!
//! The uploaded spreadsheet bytes are stored verbatim at ingest time and read
//! back at confirmation, so the submission pass always parses the same
//! original the operator previewed.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Clone)]
pub struct ObjectStore {
    s3: S3Client,
    bucket: String,
}

impl ObjectStore {
    pub fn new(s3: S3Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    /// Key for one session's original file. Session-scoped so a later upload
    /// can never overwrite the bytes a pending confirmation will re-read.
    pub fn upload_key(session_id: &Uuid, file_name: &str) -> String {
        format!("uploads/{session_id}/{}", file_name.replace('/', "_"))
    }

    pub async fn put_upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        let mut request = self
            .s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Stored original upload at s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn fetch_upload(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let object = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 fetch failed: {e}")))?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 body read failed: {e}")))?;

        Ok(bytes.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key_is_session_scoped() {
        let id = Uuid::new_v4();
        assert_eq!(
            ObjectStore::upload_key(&id, "candidates.xlsx"),
            format!("uploads/{id}/candidates.xlsx")
        );
    }

    #[test]
    fn test_upload_key_neutralizes_path_separators() {
        let id = Uuid::new_v4();
        assert_eq!(
            ObjectStore::upload_key(&id, "../../etc/passwd"),
            format!("uploads/{id}/.._.._etc_passwd")
        );
    }
}
