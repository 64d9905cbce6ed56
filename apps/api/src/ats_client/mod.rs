//! ATS client — the single point of entry for bulk-candidate submission.
//!
//! ARCHITECTURAL RULE: no other module may talk to the applicant-tracking
//! acceptance endpoint directly. All batch handoff goes through here.
//!
//! One request per operator confirmation, carrying the whole batch. The batch
//! is atomic from this side: per-record verdicts are the ATS's decision and
//! are relayed untouched. Failures are surfaced, never retried automatically.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::candidate::{CandidateRecord, UploadResult};

/// Acceptance path on the ATS, appended to the configured base URL.
const BULK_ACCEPT_PATH: &str = "/api/v1/candidates/bulk";

#[derive(Debug, Error)]
pub enum AtsError {
    #[error("no data found")]
    EmptyBatch,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ATS error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("ATS returned an unreadable response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AtsError {
    /// Message shown to the operator: the remote-supplied one when present,
    /// a generic fallback otherwise. Transport details never leak.
    pub fn surface_message(&self) -> String {
        match self {
            AtsError::EmptyBatch => "no data found".to_string(),
            AtsError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => "bulk candidate upload failed".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BulkUploadBody<'a> {
    candidates: &'a [CandidateRecord],
}

#[derive(Debug, Deserialize)]
struct RemoteErrorEnvelope {
    error: Option<RemoteErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
}

/// Seam between the ingest handlers and the concrete ATS transport.
/// Handlers depend on this trait, not on `AtsClient`.
#[async_trait]
pub trait BulkAcceptor: Send + Sync {
    async fn accept_batch(&self, candidates: &[CandidateRecord]) -> Result<UploadResult, AtsError>;
}

/// Reqwest-backed acceptor for the platform ATS.
#[derive(Clone)]
pub struct AtsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AtsClient {
    /// No local timeout is set on the submission call: the batch is never
    /// retried, so an in-flight accept is allowed to run to completion under
    /// network-layer defaults.
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl BulkAcceptor for AtsClient {
    async fn accept_batch(&self, candidates: &[CandidateRecord]) -> Result<UploadResult, AtsError> {
        // Local gate: an empty batch never reaches the network.
        if candidates.is_empty() {
            return Err(AtsError::EmptyBatch);
        }

        let url = format!("{}{}", self.base_url, BULK_ACCEPT_PATH);
        let mut request = self.client.post(&url).json(&BulkUploadBody { candidates });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body).unwrap_or_default();
            return Err(AtsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let result: UploadResult = serde_json::from_str(&body)?;

        debug!(
            "ATS accepted batch: status={}, successful={}, failed={}, total={}",
            result.status.as_str(),
            result.results.successful,
            result.results.failed,
            result.results.total
        );

        Ok(result)
    }
}

/// Pulls the human-readable message out of an ATS error payload.
/// Known shapes: `{"error": {"message": ...}}` and `{"message": ...}`.
fn extract_error_message(body: &str) -> Option<String> {
    let envelope: RemoteErrorEnvelope = serde_json::from_str(body).ok()?;
    envelope
        .error
        .and_then(|e| e.message)
        .or(envelope.message)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_from_nested_envelope() {
        let body = r#"{"error": {"code": "DUPLICATE", "message": "mobile number already exists"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("mobile number already exists")
        );
    }

    #[test]
    fn test_extract_message_from_flat_envelope() {
        let body = r#"{"message": "batch too large"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("batch too large"));
    }

    #[test]
    fn test_nested_message_preferred_over_flat() {
        let body = r#"{"error": {"message": "nested"}, "message": "flat"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("nested"));
    }

    #[test]
    fn test_extract_message_from_non_json_body_is_none() {
        assert_eq!(extract_error_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(extract_error_message(""), None);
    }

    #[test]
    fn test_blank_message_treated_as_absent() {
        assert_eq!(extract_error_message(r#"{"message": "  "}"#), None);
    }

    #[test]
    fn test_surface_message_prefers_remote_text() {
        let err = AtsError::Api {
            status: 422,
            message: "3 candidates rejected".to_string(),
        };
        assert_eq!(err.surface_message(), "3 candidates rejected");
    }

    #[test]
    fn test_surface_message_falls_back_to_generic() {
        let err = AtsError::Api {
            status: 502,
            message: String::new(),
        };
        assert_eq!(err.surface_message(), "bulk candidate upload failed");
    }

    #[tokio::test]
    async fn test_empty_batch_fails_locally_without_network() {
        // An unroutable endpoint proves no request is attempted: the call
        // returns immediately instead of failing on connect.
        let client = AtsClient::new("http://127.0.0.1:1".to_string(), None);
        let result = client.accept_batch(&[]).await;
        assert!(matches!(result, Err(AtsError::EmptyBatch)));
    }
}
