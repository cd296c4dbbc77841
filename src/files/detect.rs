//! Content type detection from file bytes.
//!
//! Uploads and archive payloads are typed by sniffing magic bytes, never by
//! trusting a client-supplied filename or Content-Type header.

/// Sniff a MIME type from leading magic bytes.
///
/// Unrecognized content falls back to `text/plain` when it looks like valid
/// UTF-8 without NUL bytes, otherwise `application/octet-stream`.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    if data.starts_with(b"%PDF") {
        return "application/pdf";
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return "image/png";
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        if &data[8..12] == b"WEBP" {
            return "image/webp";
        }
        if &data[8..12] == b"WAVE" {
            return "audio/wav";
        }
    }
    if data.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    if data.starts_with(b"ID3") || data.starts_with(&[0xFF, 0xFB]) {
        return "audio/mpeg";
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return "video/mp4";
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "video/webm";
    }
    if data.starts_with(b"OggS") {
        return "audio/ogg";
    }
    if !data.is_empty() && std::str::from_utf8(data).is_ok() && !data.contains(&0) {
        return "text/plain";
    }
    "application/octet-stream"
}

/// File extension for a sniffed MIME type, used for content-addressed names.
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "audio/wav" => "wav",
        "application/zip" => "zip",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "text/plain" => "txt",
        _ => "bin",
    }
}

/// Sniff bytes and check the detected type against an allow list.
pub fn validate_file(data: &[u8], allowed: &[&str]) -> (bool, &'static str) {
    let mime = sniff_mime(data);
    (allowed.contains(&mime), mime)
}

/// Content types accepted for resume and cover letter uploads.
pub const DOCUMENT_TYPES: &[&str] = &["application/pdf", "text/plain"];

/// Content types accepted for interview round media uploads.
pub const MEDIA_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "video/mp4",
    "video/webm",
    "text/plain",
];
