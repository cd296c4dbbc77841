//! Pre-extraction safety validation for untrusted archives.
//!
//! Every uploaded archive goes through [`validate_archive`] before a single
//! entry is extracted. Checks fail fast in entry order; all rejections are
//! [`TransferError::UnsafeArchive`] with a human-readable reason and none of
//! them are retryable.

use std::io::{Cursor, Read};

use serde_json::Value as JsonValue;
use zip::ZipArchive;

use crate::errors::{TransferError, TransferResult};

/// Hard entry-count limit.
pub const MAX_ARCHIVE_ENTRIES: usize = 1000;
/// Hard per-entry uncompressed size limit: 100 MB.
pub const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;
/// Hard total uncompressed size limit: 1 GB.
pub const MAX_TOTAL_SIZE: u64 = 1024 * 1024 * 1024;
/// Zip-bomb heuristic: reject above 100:1 uncompressed-to-compressed.
pub const MAX_COMPRESSION_RATIO: u64 = 100;

/// What a clean scan saw.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveStats {
    pub file_count: usize,
    pub total_uncompressed_size: u64,
}

/// Scan archive bytes against the safety limits without extracting anything.
pub fn validate_archive(bytes: &[u8]) -> TransferResult<ArchiveStats> {
    let compressed_size = bytes.len() as u64;
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| TransferError::UnsafeArchive("invalid archive".to_string()))?;

    if archive.len() > MAX_ARCHIVE_ENTRIES {
        return Err(TransferError::UnsafeArchive(format!(
            "too many files: {} entries (limit {})",
            archive.len(),
            MAX_ARCHIVE_ENTRIES
        )));
    }

    let mut total_uncompressed_size: u64 = 0;
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|_| TransferError::UnsafeArchive("invalid archive".to_string()))?;
        let name = entry.name().to_string();

        if is_absolute_entry(&name) {
            return Err(TransferError::UnsafeArchive(format!(
                "absolute path in entry: {}",
                name
            )));
        }
        if has_parent_component(&name) {
            return Err(TransferError::UnsafeArchive(format!(
                "path traversal in entry: {}",
                name
            )));
        }
        if entry.size() > MAX_ENTRY_SIZE {
            return Err(TransferError::UnsafeArchive(format!(
                "file too large: {} is {} bytes (limit {})",
                name,
                entry.size(),
                MAX_ENTRY_SIZE
            )));
        }
        total_uncompressed_size += entry.size();
        if total_uncompressed_size > MAX_TOTAL_SIZE {
            return Err(TransferError::UnsafeArchive(format!(
                "total size exceeded: {} bytes (limit {})",
                total_uncompressed_size, MAX_TOTAL_SIZE
            )));
        }
    }

    if compressed_size > 0 && total_uncompressed_size / compressed_size > MAX_COMPRESSION_RATIO {
        return Err(TransferError::UnsafeArchive(format!(
            "suspicious compression ratio: {}:1 (limit {}:1)",
            total_uncompressed_size / compressed_size,
            MAX_COMPRESSION_RATIO
        )));
    }

    Ok(ArchiveStats {
        file_count: archive.len(),
        total_uncompressed_size,
    })
}

fn is_absolute_entry(name: &str) -> bool {
    name.starts_with('/')
        || name.starts_with('\\')
        || name
            .as_bytes()
            .get(1)
            .is_some_and(|b| *b == b':' && name.as_bytes()[0].is_ascii_alphabetic())
}

fn has_parent_component(name: &str) -> bool {
    name.split(['/', '\\']).any(|component| component == "..")
}

/// Read one named entry fully into memory.
///
/// Missing entries are an [`TransferError::InvalidDocument`]: the caller asked
/// for a required or manifest-declared entry that the archive does not carry.
pub fn read_entry(bytes: &[u8], name: &str) -> TransferResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = archive
        .by_name(name)
        .map_err(|_| TransferError::InvalidDocument(format!("missing {} in archive", name)))?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read and parse one named JSON entry.
pub fn read_json_entry(bytes: &[u8], name: &str) -> TransferResult<JsonValue> {
    let raw = read_entry(bytes, name)?;
    serde_json::from_slice(&raw)
        .map_err(|err| TransferError::InvalidDocument(format!("{} is not valid JSON: {}", name, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options =
                FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            for (name, data) in entries {
                writer.start_file(*name, options).expect("start entry");
                writer.write_all(data).expect("write entry");
            }
            writer.finish().expect("finish zip");
        }
        cursor.into_inner()
    }

    #[test]
    fn test_accepts_small_clean_archive() {
        let bytes = build_zip(&[("data.json", b"{}"), ("manifest.json", b"{}")]);
        let stats = validate_archive(&bytes).expect("valid");
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.total_uncompressed_size, 4);
    }

    #[test]
    fn test_rejects_too_many_entries() {
        let names: Vec<String> = (0..1001).map(|i| format!("f{}", i)).collect();
        let entries: Vec<(&str, &[u8])> = names
            .iter()
            .map(|n| (n.as_str(), b"".as_slice()))
            .collect();
        let bytes = build_zip(&entries);

        let err = validate_archive(&bytes).expect_err("rejected");
        assert!(err.to_string().contains("too many files"));
    }

    #[test]
    fn test_rejects_path_traversal() {
        let bytes = build_zip(&[("../../etc/passwd", b"pwned")]);
        let err = validate_archive(&bytes).expect_err("rejected");
        assert!(err.to_string().contains("path traversal"));
    }

    #[test]
    fn test_rejects_absolute_path() {
        let bytes = build_zip(&[("/tmp/x", b"pwned")]);
        let err = validate_archive(&bytes).expect_err("rejected");
        assert!(err.to_string().contains("absolute path"));
    }

    #[test]
    fn test_rejects_suspicious_compression_ratio() {
        // 10 MB of one byte deflates to well under 1% of its size.
        let bomb = vec![0u8; 10 * 1024 * 1024];
        let bytes = build_zip(&[("data.json", bomb.as_slice())]);

        let err = validate_archive(&bytes).expect_err("rejected");
        assert!(err.to_string().contains("compression ratio"));
    }

    #[test]
    fn test_rejects_malformed_container() {
        let err = validate_archive(b"definitely not a zip").expect_err("rejected");
        assert!(err.to_string().contains("invalid archive"));
    }

    #[test]
    fn test_read_entry_round_trips() {
        let bytes = build_zip(&[("data.json", br#"{"k": 1}"#)]);
        let raw = read_entry(&bytes, "data.json").expect("entry");
        assert_eq!(raw, br#"{"k": 1}"#);

        let parsed = read_json_entry(&bytes, "data.json").expect("json");
        assert_eq!(parsed["k"], 1);
    }

    #[test]
    fn test_read_entry_missing_is_invalid_document() {
        let bytes = build_zip(&[("data.json", b"{}")]);
        let err = read_entry(&bytes, "manifest.json").expect_err("missing");
        assert!(matches!(err, TransferError::InvalidDocument(_)));
        assert!(err.to_string().contains("manifest.json"));
    }
}
