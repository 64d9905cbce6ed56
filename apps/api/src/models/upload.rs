use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One audit row per confirmed submission. Append-only; feeds the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadAuditRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub file_name: String,
    pub total: i32,
    pub successful: i32,
    pub failed: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Per-day aggregate over the audit log, as served to the dashboard chart.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyUploadStats {
    pub day: chrono::NaiveDate,
    pub uploads: i64,
    pub candidates: i64,
    pub accepted: i64,
    pub rejected: i64,
}
