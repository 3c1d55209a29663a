//! `POST /api/reports/upload`: batch PDF upload and extraction.
//!
//! Decodes base64 payloads, then hands the whole batch to the synchronous
//! pipeline on the blocking pool. The extraction client and the database
//! connection both live on that thread, and so does the caller's report
//! book guard, so a second batch from the same user waits for this one.

use axum::extract::State;
use axum::Extension;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::config::MAX_UPLOAD_FILES;
use crate::pipeline::upload::{process_batch, BatchError, UploadFile, UploadOutcome};

/// Maximum decoded size of one document (20 MB).
pub const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadPayload>,
}

#[derive(Deserialize)]
pub struct UploadPayload {
    pub filename: String,
    /// Plain base64 or a data URL (`data:application/pdf;base64,...`)
    pub data: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    /// Report book version after the batch
    pub version: u64,
    pub results: Vec<UploadOutcome>,
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    if payload.files.is_empty() {
        return Err(ApiError::BadRequest("No files in upload".into()));
    }
    if payload.files.len() > MAX_UPLOAD_FILES {
        return Err(BatchError::TooManyFiles {
            max: MAX_UPLOAD_FILES,
        }
        .into());
    }

    let mut files = Vec::with_capacity(payload.files.len());
    for file in payload.files {
        let bytes = decode_data_url(&file.data).map_err(|e| {
            ApiError::BadRequest(format!("Invalid data for '{}': {e}", file.filename))
        })?;
        if bytes.len() > MAX_FILE_BYTES {
            return Err(ApiError::BadRequest(format!(
                "'{}' exceeds 20 MB size limit ({} bytes)",
                file.filename,
                bytes.len()
            )));
        }
        files.push(UploadFile {
            name: file.filename,
            bytes,
        });
    }

    let owner = caller.user.id;
    let core = ctx.core.clone();
    let mut book = core.book(owner).await?;
    let response = tokio::task::spawn_blocking(move || -> Result<UploadResponse, ApiError> {
        // Blocking HTTP client must be built off the async runtime
        let extractor = core.extractor()?;
        let conn = core.open_db()?;
        let documents = core.documents();
        let results = process_batch(
            &conn,
            documents.as_ref(),
            extractor.as_ref(),
            Some(owner),
            files,
            &mut book,
        )?;
        Ok(UploadResponse {
            version: book.version(),
            results,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Upload task failed: {e}")))??;

    Ok(Json(response))
}

/// Decode a data URL (`data:...;base64,XXXX`) or raw base64 to bytes.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let base64_data = match data_url.find(',') {
        Some(idx) => &data_url[idx + 1..],
        None => data_url,
    };

    base64::engine::general_purpose::STANDARD
        .decode(base64_data.trim())
        .map_err(|e| format!("Base64 decode failed: {e}"))
}
