use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::convert::ScratchDir;
use crate::db;
use crate::error::AppError;
use crate::models::ConversionStatus;
use crate::state::{AppState, SharedState};
use crate::storage::{self, DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE};
use crate::upload;

const FILE_NOT_FOUND: &str = "File not found. It may have been deleted or never existed.";

#[derive(Serialize)]
pub struct ConvertResponse {
    pub status: &'static str,
    pub file_id: Uuid,
}

pub async fn convert(
    State(state): State<SharedState>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConvertResponse>, AppError> {
    let upload = upload::read_file_field(&headers, body, "file")
        .await
        .map_err(AppError::BadRequest)?;

    if !upload::is_docx(&upload.filename) {
        tracing::warn!("Received non-DOCX file for conversion: {}", upload.filename);
        return Err(AppError::BadRequest(
            "Only .docx files are supported for conversion.".to_string(),
        ));
    }

    if upload.data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty.".to_string()));
    }

    let file_id = Uuid::now_v7();
    db::conversions::create(&state.pool, file_id, auth.user_id, &upload.filename).await?;

    let result = run_conversion(&state, file_id, &upload.data).await;

    let status = if result.is_ok() {
        ConversionStatus::Completed
    } else {
        ConversionStatus::Failed
    };
    if let Err(e) = db::conversions::set_status(&state.pool, file_id, status).await {
        tracing::error!("Failed to record status of conversion {file_id}: {e}");
    }
    result?;

    tracing::info!(
        "Converted '{}' for '{}' as {file_id}",
        upload.filename,
        auth.username
    );

    Ok(Json(ConvertResponse {
        status: "completed",
        file_id,
    }))
}

/// Save, upload original, convert, upload PDF. The scratch directory is
/// removed on every return path.
async fn run_conversion(state: &AppState, file_id: Uuid, data: &[u8]) -> Result<(), AppError> {
    let scratch = ScratchDir::create(&state.config.converter.work_dir, &file_id.to_string())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create scratch dir: {e}")))?;

    let input = scratch.path().join(format!("{file_id}.docx"));
    tokio::fs::write(&input, data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save upload {}: {e}", input.display())))?;

    state
        .storage
        .put_file(&storage::upload_key(file_id), &input, DOCX_CONTENT_TYPE)
        .await?;

    let timeout = state.converter.timeout();
    let pdf = match tokio::time::timeout(timeout, state.converter.convert(&input, scratch.path())).await {
        Ok(converted) => converted?,
        Err(_) => {
            return Err(AppError::Internal(format!(
                "Conversion of {file_id} timed out after {}s",
                timeout.as_secs()
            )));
        }
    };

    state
        .storage
        .put_file(&storage::converted_key(file_id), &pdf, PDF_CONTENT_TYPE)
        .await?;

    Ok(())
}

pub async fn download(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    // Identifiers that are not UUIDs name no stored file.
    let file_id = Uuid::parse_str(&file_id)
        .map_err(|_| AppError::NotFound(FILE_NOT_FOUND.to_string()))?;

    let conversion = db::conversions::find_for_user(&state.pool, file_id, auth.user_id)
        .await?
        .filter(|c| c.is_completed())
        .ok_or_else(|| AppError::NotFound(FILE_NOT_FOUND.to_string()))?;

    let key = storage::converted_key(conversion.id);
    if let Err(e) = state.storage.head(&key).await {
        if matches!(e, storage::StorageError::NotFound(_)) {
            tracing::warn!("Download request for missing object: {key}");
        }
        return Err(e.into());
    }

    let url = state
        .storage
        .presigned_get(&key, state.config.storage.download_ttl)
        .await?;

    tracing::info!("Generated download link for {key}");
    Ok(Redirect::to(&url).into_response())
}
