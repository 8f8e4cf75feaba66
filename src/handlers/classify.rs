use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id;
use crate::models::{ClassificationResult, ClassifyRequest, UploadedFile};
use crate::services::{classify_email_and_respond, file_validator, mime_sniffer, text_extractor};
use crate::state::AppState;

pub const FILE_FIELD: &str = "file";

/// Classifies email text sent as JSON.
pub async fn classify_email_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> AppResult<Json<ClassificationResult>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let Json(payload) = payload.map_err(|e| {
        warn!(request_id = %request_id, error = %e, "Rejected classification payload");
        AppError::invalid_request(e.body_text())
    })?;

    if payload.text.trim().is_empty() {
        return Err(AppError::invalid_request("text must not be empty"));
    }

    info!(
        request_id = %request_id,
        text_length = payload.text.len(),
        "Starting text classification request"
    );

    let result = classify_email_and_respond(state.classifier.as_ref(), &payload.text).await;
    respond(result, &request_id, start)
}

/// Classifies an email uploaded as a TXT or PDF file.
pub async fn classify_email_file_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ClassificationResult>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    info!(request_id = %request_id, "Starting file classification request");

    let mut multipart = multipart.map_err(|e| {
        warn!(request_id = %request_id, error = %e, "Request is not a multipart form");
        AppError::invalid_request(e.body_text())
    })?;

    let file = read_uploaded_file(&mut multipart, state.config.max_file_size_mb).await?;
    info!(
        request_id = %request_id,
        file_name = file.file_name.as_deref().unwrap_or("<none>"),
        declared_content_type = file.declared_content_type.as_deref().unwrap_or("<none>"),
        file_size = file.size,
        "File received"
    );

    let text = tokio::task::spawn_blocking(move || extract_email_text(file))
        .await?
        .map_err(|e| {
            warn!(request_id = %request_id, error = %e, "File rejected");
            e
        })?;

    info!(
        request_id = %request_id,
        text_length = text.len(),
        "Text extracted from upload"
    );

    let result = classify_email_and_respond(state.classifier.as_ref(), &text).await;
    respond(result, &request_id, start)
}

/// Sniffs, validates and extracts the text of an uploaded file.
///
/// Blocking: PDF parsing is CPU bound, so callers on the runtime should go
/// through `spawn_blocking`.
pub fn extract_email_text(mut file: UploadedFile) -> AppResult<String> {
    let detected = mime_sniffer::detect(&mut file.stream)
        .map_err(|e| AppError::unprocessable(format!("failed to read file: {}", e)))?;
    debug!(mime_type = %detected, "Detected file type");

    let mime_type = file_validator::validate(detected)?;
    text_extractor::extract(&mut file.stream, &mime_type)
}

async fn read_uploaded_file(
    multipart: &mut Multipart,
    max_file_size_mb: usize,
) -> AppResult<UploadedFile> {
    let max_size_bytes = max_file_size_mb * 1024 * 1024;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge { limit: max_file_size_mb }
        } else {
            AppError::invalid_request(format!("Failed to read multipart field: {}", e))
        }
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::FileTooLarge { limit: max_file_size_mb }
            } else {
                AppError::invalid_request(format!("Failed to read file data: {}", e))
            }
        })?;

        if data.len() > max_size_bytes {
            warn!(
                file_size = data.len(),
                limit_bytes = max_size_bytes,
                "Uploaded file exceeds size limit"
            );
            return Err(AppError::FileTooLarge { limit: max_file_size_mb });
        }

        return Ok(UploadedFile::new(data)
            .with_file_name(file_name)
            .with_declared_content_type(content_type));
    }

    Err(AppError::MissingFile)
}

fn respond(
    result: ClassificationResult,
    request_id: &str,
    start: Instant,
) -> AppResult<Json<ClassificationResult>> {
    let total_time = start.elapsed().as_millis() as u64;

    if result.is_error() {
        error!(
            request_id = %request_id,
            total_time_ms = total_time,
            "Classification unavailable"
        );
        return Err(AppError::ClassificationFailure { reply: result.reply });
    }

    info!(
        request_id = %request_id,
        category = %result.category,
        total_time_ms = total_time,
        "Request completed successfully"
    );
    Ok(Json(result))
}
