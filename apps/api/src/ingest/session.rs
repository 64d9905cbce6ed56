//! Transient upload sessions.
//!
//! One session per operator upload, holding the transient fields of the flow
//! (file, preview totals, result, error, in-flight flag). Sessions live in
//! Redis under a TTL; the original bytes live in object storage and are
//! re-read at confirmation time. Transitions happen only on operator actions
//! and on remote-response arrival: previewed -> uploading -> completed|failed.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::UploadResult;

/// Upper bound on how long a confirmation may hold the in-flight lock.
/// Bounds a crashed upload; a healthy one releases explicitly.
const UPLOAD_LOCK_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Previewed,
    Uploading,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: Uuid,
    pub file_name: String,
    /// Multipart content type, kept for the confirmation re-parse when the
    /// file name carries no usable extension.
    pub content_type: Option<String>,
    pub s3_key: String,
    pub total_rows: usize,
    pub status: SessionStatus,
    pub result: Option<UploadResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(
        id: Uuid,
        file_name: String,
        content_type: Option<String>,
        s3_key: String,
        total_rows: usize,
    ) -> Self {
        Self {
            id,
            file_name,
            content_type,
            s3_key,
            total_rows,
            status: SessionStatus::Previewed,
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Remote verdict arrived. A `partial` or even all-rejected result is a
    /// completed submission, not a failure of the flow.
    pub fn complete(&mut self, result: UploadResult) {
        self.status = SessionStatus::Completed;
        self.result = Some(result);
        self.error = None;
    }

    /// Submission could not produce a result (transport or remote failure).
    pub fn fail(&mut self, message: String) {
        self.status = SessionStatus::Failed;
        self.error = Some(message);
    }
}

/// Redis-backed store for upload sessions.
#[derive(Clone)]
pub struct SessionStore {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    fn session_key(id: &Uuid) -> String {
        format!("ingest:session:{id}")
    }

    fn lock_key(id: &Uuid) -> String {
        format!("ingest:lock:{id}")
    }

    pub async fn put(&self, session: &UploadSession) -> Result<(), AppError> {
        let payload =
            serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
        let mut conn = self.redis.clone();
        let _: () = conn
            .set_ex(Self::session_key(&session.id), payload, self.ttl_secs)
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: &Uuid) -> Result<Option<UploadSession>, AppError> {
        let mut conn = self.redis.clone();
        let payload: Option<String> = conn.get(Self::session_key(id)).await?;
        match payload {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).map_err(|e| AppError::Internal(e.into()))?,
            )),
            None => Ok(None),
        }
    }

    /// Takes the per-session in-flight lock. Returns false when another
    /// confirmation already holds it; the caller maps that to 409.
    pub async fn try_begin_upload(&self, id: &Uuid) -> Result<bool, AppError> {
        let mut conn = self.redis.clone();
        let acquired: Option<String> = redis::cmd("SET")
            .arg(Self::lock_key(id))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(UPLOAD_LOCK_TTL_SECS)
            .query_async(&mut conn)
            .await?;
        Ok(acquired.is_some())
    }

    pub async fn end_upload(&self, id: &Uuid) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(Self::lock_key(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{UploadStatus, UploadSummary};

    fn result(successful: u32, failed: u32) -> UploadResult {
        UploadResult {
            status: if failed == 0 {
                UploadStatus::Success
            } else {
                UploadStatus::Partial
            },
            results: UploadSummary {
                successful,
                failed,
                total: successful + failed,
                details: vec![],
            },
        }
    }

    #[test]
    fn test_new_session_starts_previewed() {
        let session = UploadSession::new(Uuid::new_v4(), "candidates.xlsx".to_string(), None, "key".to_string(), 3);
        assert_eq!(session.status, SessionStatus::Previewed);
        assert!(session.result.is_none());
        assert!(session.error.is_none());
        assert_eq!(session.total_rows, 3);
    }

    #[test]
    fn test_complete_records_result_and_clears_error() {
        let mut session = UploadSession::new(Uuid::new_v4(), "c.csv".to_string(), None, "key".to_string(), 3);
        session.fail("transient".to_string());
        session.complete(result(2, 1));
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.error.is_none());
        assert_eq!(session.result.as_ref().unwrap().results.total, 3);
    }

    #[test]
    fn test_fail_records_message() {
        let mut session = UploadSession::new(Uuid::new_v4(), "c.csv".to_string(), None, "key".to_string(), 3);
        session.fail("upstream rejected the batch".to_string());
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(session.error.as_deref(), Some("upstream rejected the batch"));
    }

    #[test]
    fn test_session_serde_round_trip() {
        let mut session = UploadSession::new(Uuid::new_v4(), "c.csv".to_string(), None, "uploads/x/c.csv".to_string(), 2);
        session.complete(result(2, 0));
        let json = serde_json::to_string(&session).unwrap();
        let back: UploadSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, session.id);
        assert_eq!(back.status, SessionStatus::Completed);
        assert_eq!(back.result.unwrap().results.successful, 2);
    }

    #[test]
    fn test_key_namespaces_are_distinct() {
        let id = Uuid::new_v4();
        assert_eq!(SessionStore::session_key(&id), format!("ingest:session:{id}"));
        assert_eq!(SessionStore::lock_key(&id), format!("ingest:lock:{id}"));
    }
}
