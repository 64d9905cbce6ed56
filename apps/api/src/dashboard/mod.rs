//! Dashboard analytics: per-day upload aggregates for the operator chart.
//! Chart rendering stays client-side; this only serves the numbers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::upload::{DailyUploadStats, UploadAuditRow};
use crate::state::AppState;

const DEFAULT_WINDOW_DAYS: i32 = 30;
const MAX_WINDOW_DAYS: i32 = 365;
const RECENT_UPLOADS_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i32>,
}

fn clamp_window(days: Option<i32>) -> i32 {
    days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, MAX_WINDOW_DAYS)
}

/// GET /api/v1/dashboard/uploads
///
/// Per-day totals over the audit log, newest first.
pub async fn handle_upload_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<Vec<DailyUploadStats>>, AppError> {
    let days = clamp_window(params.days);
    let stats = fetch_upload_stats(&state.db, days).await?;
    Ok(Json(stats))
}

async fn fetch_upload_stats(db: &PgPool, days: i32) -> Result<Vec<DailyUploadStats>, AppError> {
    let stats = sqlx::query_as::<_, DailyUploadStats>(
        r#"
        SELECT
            created_at::date AS day,
            COUNT(*) AS uploads,
            COALESCE(SUM(total), 0)::bigint AS candidates,
            COALESCE(SUM(successful), 0)::bigint AS accepted,
            COALESCE(SUM(failed), 0)::bigint AS rejected
        FROM upload_audits
        WHERE created_at >= NOW() - make_interval(days => $1)
        GROUP BY day
        ORDER BY day DESC
        "#,
    )
    .bind(days)
    .fetch_all(db)
    .await?;

    Ok(stats)
}

/// GET /api/v1/dashboard/recent
///
/// The latest audit rows, for the table beside the chart.
pub async fn handle_recent_uploads(
    State(state): State<AppState>,
) -> Result<Json<Vec<UploadAuditRow>>, AppError> {
    let rows = sqlx::query_as::<_, UploadAuditRow>(
        "SELECT * FROM upload_audits ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_UPLOADS_LIMIT)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_to_thirty_days() {
        assert_eq!(clamp_window(None), 30);
    }

    #[test]
    fn test_window_is_clamped_to_a_year() {
        assert_eq!(clamp_window(Some(5000)), 365);
        assert_eq!(clamp_window(Some(0)), 1);
        assert_eq!(clamp_window(Some(-3)), 1);
        assert_eq!(clamp_window(Some(90)), 90);
    }
}
