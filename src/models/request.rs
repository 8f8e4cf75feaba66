use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// JSON body of the raw-text classification endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// A file received in a multipart upload.
///
/// `file_name` and `declared_content_type` come from the client and are only
/// ever logged; the content type used by the pipeline is sniffed from `stream`.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub declared_content_type: Option<String>,
    pub size: usize,
    pub stream: Cursor<Bytes>,
}

impl UploadedFile {
    pub fn new(content: Bytes) -> Self {
        let size = content.len();
        Self {
            file_name: None,
            declared_content_type: None,
            size,
            stream: Cursor::new(content),
        }
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn with_declared_content_type(mut self, content_type: Option<String>) -> Self {
        self.declared_content_type = content_type;
        self
    }
}
