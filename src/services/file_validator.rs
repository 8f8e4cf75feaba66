use crate::error::{AppError, AppResult};
use crate::services::mime_sniffer::{MIME_PDF, MIME_TEXT};

pub const ALLOWED_MIME_TYPES: [&str; 2] = [MIME_PDF, MIME_TEXT];

/// Passes the sniffed MIME type through when it is one we can extract text from.
pub fn validate(detected_mime_type: String) -> AppResult<String> {
    if ALLOWED_MIME_TYPES.contains(&detected_mime_type.as_str()) {
        Ok(detected_mime_type)
    } else {
        tracing::info!(mime_type = %detected_mime_type, "Rejected unsupported file type");
        Err(AppError::UnsupportedMediaType)
    }
}
