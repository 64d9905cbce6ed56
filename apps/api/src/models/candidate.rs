use serde::{Deserialize, Serialize};

/// Canonical candidate row after header-alias resolution.
/// Both fields default to `""` when no alias column is populated; the ATS is
/// responsible for any deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    #[serde(rename = "mobileNo")]
    pub mobile_no: String,
}

impl CandidateRecord {
    /// Canonical field names with empty values, in display order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.mobile_no.is_empty() {
            missing.push("mobileNo");
        }
        missing
    }
}

/// Batch outcome reported by the ATS acceptance endpoint.
/// Opaque to this service beyond recording and relaying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub status: UploadStatus,
    pub results: UploadSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Partial,
    Failure,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Success => "success",
            UploadStatus::Partial => "partial",
            UploadStatus::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub successful: u32,
    pub failed: u32,
    pub total: u32,
    pub details: Vec<RecordOutcome>,
}

/// Per-record verdict inside an `UploadResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub name: String,
    #[serde(rename = "mobileNo")]
    pub mobile_no: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
