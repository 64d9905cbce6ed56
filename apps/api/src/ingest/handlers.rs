//! Axum route handlers for the candidate ingest flow.
//!
//! Two-phase: `ingest` parses the upload and returns a preview; `confirm`
//! re-derives the batch from the stored original and hands it to the ATS.
//! Every error is caught here and rendered as an inline notice; nothing in
//! this flow is fatal to the process.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::normalizer::normalize_rows;
use crate::ingest::parser::parse_bytes;
use crate::ingest::preview::{build_preview, BatchPreview};
use crate::ingest::session::{SessionStatus, UploadSession};
use crate::models::candidate::UploadResult;
use crate::state::AppState;
use crate::storage::ObjectStore;

#[derive(Debug, Serialize)]
pub struct IngestPreviewResponse {
    pub session_id: Uuid,
    pub file_name: String,
    pub format: &'static str,
    pub preview: BatchPreview,
    pub warnings: Vec<String>,
    /// How long the operator has to confirm before the session expires.
    pub expires_in_secs: u64,
}

/// POST /api/v1/candidates/ingest
///
/// Multipart upload (`file` field). Parses and normalizes for preview, stores
/// the original bytes, and opens an upload session the operator can confirm.
pub async fn handle_ingest(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestPreviewResponse>, AppError> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("unreadable multipart request: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "upload".to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read file data: {e}")))?;
            file = Some((file_name, content_type, data));
            break;
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::Validation("no file provided".to_string()))?;

    // Preview pass. A parse failure surfaces as a 400 and no session opens.
    let sheet = parse_bytes(&file_name, content_type.as_deref(), &data)?;
    let records = normalize_rows(&sheet.rows);
    let preview = build_preview(&records);

    let session_id = Uuid::new_v4();
    let s3_key = ObjectStore::upload_key(&session_id, &file_name);
    let session = UploadSession::new(
        session_id,
        file_name.clone(),
        content_type.clone(),
        s3_key,
        records.len(),
    );

    state
        .store
        .put_upload(&session.s3_key, data.to_vec(), content_type.as_deref())
        .await?;
    state.sessions.put(&session).await?;

    info!(
        "Ingested {} ({} rows, {} flagged) as session {}",
        file_name, preview.total_rows, preview.rows_with_missing_fields, session.id
    );

    Ok(Json(IngestPreviewResponse {
        session_id: session.id,
        file_name,
        format: sheet.format.as_str(),
        preview,
        warnings: sheet.warnings,
        expires_in_secs: state.config.session_ttl_secs,
    }))
}

/// GET /api/v1/candidates/ingest/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadSession>, AppError> {
    let session = state
        .sessions
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload session {id} not found or expired")))?;
    Ok(Json(session))
}

/// POST /api/v1/candidates/ingest/:id/confirm
///
/// Re-parses the stored original, submits the whole batch in one request,
/// and relays the per-record outcome. At most one confirmation runs per
/// session; a concurrent one gets 409.
pub async fn handle_confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadResult>, AppError> {
    let mut session = state
        .sessions
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload session {id} not found or expired")))?;

    if session.status == SessionStatus::Completed {
        return Err(AppError::Validation(
            "this batch has already been submitted".to_string(),
        ));
    }

    if !state.sessions.try_begin_upload(&id).await? {
        return Err(AppError::UploadInFlight);
    }

    session.status = SessionStatus::Uploading;
    state.sessions.put(&session).await?;

    let outcome = submit_batch(&state, &session).await;

    state.sessions.end_upload(&id).await?;

    match outcome {
        Ok(result) => {
            session.complete(result.clone());
            state.sessions.put(&session).await?;
            // The submission itself succeeded; a lost audit row must not
            // turn the response into an error.
            if let Err(err) = record_audit(&state.db, &session, &result).await {
                tracing::error!("Failed to record upload audit for session {id}: {err}");
            }
            info!(
                "Session {} submitted: {}/{} accepted",
                id, result.results.successful, result.results.total
            );
            Ok(Json(result))
        }
        Err(err) => {
            session.fail(err.to_string());
            state.sessions.put(&session).await?;
            Err(err)
        }
    }
}

/// Submission pass: re-derives the batch from the stored original bytes,
/// independent of whatever the preview pass computed.
async fn submit_batch(state: &AppState, session: &UploadSession) -> Result<UploadResult, AppError> {
    let data = state.store.fetch_upload(&session.s3_key).await?;
    let sheet = parse_bytes(&session.file_name, session.content_type.as_deref(), &data)?;
    let records = normalize_rows(&sheet.rows);

    // Empty batch fails inside the acceptor before any network I/O.
    let result = state.acceptor.accept_batch(&records).await?;
    Ok(result)
}

async fn record_audit(
    db: &sqlx::PgPool,
    session: &UploadSession,
    result: &UploadResult,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO upload_audits
            (id, session_id, file_name, total, successful, failed, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session.id)
    .bind(&session.file_name)
    .bind(result.results.total as i32)
    .bind(result.results.successful as i32)
    .bind(result.results.failed as i32)
    .bind(result.status.as_str())
    .execute(db)
    .await?;
    Ok(())
}
