//! Content-based MIME type detection.
//!
//! Only the first [`SNIFF_LEN`] bytes are inspected. Client-supplied file
//! names and content types are never consulted.

use std::io::{self, Read, Seek, SeekFrom};

pub const SNIFF_LEN: u64 = 2048;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_EMPTY: &str = "application/x-empty";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Magic numbers for binary formats commonly mistaken for documents.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"II*\x00", "image/tiff"),
    (b"MM\x00*", "image/tiff"),
    (b"PK\x03\x04", "application/zip"),
    (b"PK\x05\x06", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"BZh", "application/x-bzip2"),
    (b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
    (b"Rar!\x1a\x07", "application/x-rar"),
    (b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1", "application/x-ole-storage"),
    (b"{\\rtf", "text/rtf"),
    (b"%!PS", "application/postscript"),
    (b"\x7fELF", "application/x-executable"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"\x00\x00\x01\x00", "image/vnd.microsoft.icon"),
];

/// Detects the MIME type of `stream` from its leading bytes.
///
/// The stream is always rewound to offset 0 afterwards, even when reading the
/// prefix fails, so a subsequent full read sees the whole content.
pub fn detect<R: Read + Seek>(stream: &mut R) -> io::Result<String> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN as usize);
    let read = stream.by_ref().take(SNIFF_LEN).read_to_end(&mut prefix);
    stream.seek(SeekFrom::Start(0))?;
    read?;

    let mime_type = sniff(&prefix);
    tracing::debug!(
        prefix_len = prefix.len(),
        mime_type = mime_type,
        "MIME type sniffed from content"
    );
    Ok(mime_type.to_string())
}

/// Classifies a byte prefix.
pub fn sniff(prefix: &[u8]) -> &'static str {
    if prefix.is_empty() {
        return MIME_EMPTY;
    }
    if prefix.starts_with(b"%PDF-") {
        return MIME_PDF;
    }
    if let Some(&(_, mime_type)) = SIGNATURES
        .iter()
        .find(|(magic, _)| prefix.starts_with(magic))
    {
        return mime_type;
    }
    if is_riff(prefix, b"WEBP") {
        return "image/webp";
    }
    if is_riff(prefix, b"WAVE") {
        return "audio/x-wav";
    }
    if !looks_like_text(prefix) {
        return MIME_OCTET_STREAM;
    }
    markup_type(prefix).unwrap_or(MIME_TEXT)
}

fn is_riff(prefix: &[u8], form: &[u8; 4]) -> bool {
    prefix.len() >= 12 && prefix.starts_with(b"RIFF") && &prefix[8..12] == form
}

fn markup_type(prefix: &[u8]) -> Option<&'static str> {
    let start = prefix
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(prefix.len());
    let head = &prefix[start..];
    let starts_with_ci = |tag: &[u8]| {
        head.len() >= tag.len() && head[..tag.len()].eq_ignore_ascii_case(tag)
    };

    if head.starts_with(b"<?xml") {
        Some("text/xml")
    } else if starts_with_ci(b"<!doctype html") || starts_with_ci(b"<html") {
        Some("text/html")
    } else {
        None
    }
}

/// Bytes of any encoding count as text once NUL and the C0 controls that
/// never appear in text files are ruled out. High bytes cover UTF-8, ISO-8859
/// and Windows-1252 alike.
fn looks_like_text(prefix: &[u8]) -> bool {
    !prefix.iter().any(|&b| is_binary_control(b))
}

fn is_binary_control(b: u8) -> bool {
    matches!(b, 0x00..=0x06 | 0x0e..=0x1a | 0x1c..=0x1f | 0x7f)
}
