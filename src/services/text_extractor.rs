use std::io::Read;
use std::time::Instant;

use lopdf::Document;

use crate::error::{AppError, AppResult};
use crate::services::mime_sniffer::{MIME_PDF, MIME_TEXT};

/// Reads the whole of `stream` and turns it into single-line text according
/// to `mime_type`.
///
/// Fails with [`AppError::UnprocessableContent`] when the bytes cannot be read
/// or parsed and with [`AppError::EmptyContent`] when nothing but whitespace
/// comes out. Types other than plain text and PDF yield empty content.
pub fn extract<R: Read>(stream: &mut R, mime_type: &str) -> AppResult<String> {
    let start = Instant::now();

    let text = match mime_type {
        MIME_TEXT => decode_plain_text(read_all(stream)?),
        MIME_PDF => extract_pdf_text(&read_all(stream)?)?,
        other => {
            tracing::warn!(mime_type = other, "No extractor for MIME type");
            String::new()
        }
    };

    let text = normalize(text)?;

    tracing::debug!(
        mime_type = mime_type,
        text_length = text.len(),
        processing_time_ms = start.elapsed().as_millis() as u64,
        "Text extracted from file"
    );
    Ok(text)
}

/// Rejects blank text and collapses every newline into a single space.
pub fn normalize(text: String) -> AppResult<String> {
    if text.trim().is_empty() {
        return Err(AppError::EmptyContent);
    }
    Ok(text.replace('\n', " "))
}

fn read_all<R: Read>(stream: &mut R) -> AppResult<Vec<u8>> {
    let mut content = Vec::new();
    stream
        .read_to_end(&mut content)
        .map_err(|e| AppError::unprocessable(format!("failed to read file: {}", e)))?;
    Ok(content)
}

fn decode_plain_text(content: Vec<u8>) -> String {
    match String::from_utf8(content) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("File is not valid UTF-8, decoding with replacement characters");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Concatenates the text of every page in page order, without separators.
fn extract_pdf_text(content: &[u8]) -> AppResult<String> {
    let document = Document::load_mem(content)
        .map_err(|e| AppError::unprocessable(format!("failed to load PDF: {}", e)))?;

    let pages = document.get_pages();
    tracing::debug!(pages = pages.len(), "PDF loaded");

    let mut text = String::new();
    for page_number in pages.keys() {
        let page_text = document
            .extract_text(&[*page_number])
            .map_err(|e| {
                AppError::unprocessable(format!(
                    "failed to extract text from page {}: {}",
                    page_number, e
                ))
            })?;
        // lopdf ends every text object with a newline; drop the one closing the page.
        text.push_str(page_text.strip_suffix('\n').unwrap_or(&page_text));
    }

    Ok(text)
}
