//! Export engine: document assembly and archive packing.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::errors::TransferResult;
use crate::files::detect;
use crate::files::store::{content_hash, FileStore};

use super::manifest::{ExportDocument, FileManifestEntry, TransferManifest, UserStub};
use super::registry::EntityRegistry;
use super::serializer;
use super::FORMAT_VERSION;

/// Snapshot everything the user owns into a versioned document.
///
/// Walks the registry in rank order and serializes each type's records with
/// one level of relationship expansion. Read-only; any per-record failure
/// aborts the whole export rather than producing a partial document.
pub async fn export_user_data(
    db: &DatabaseConnection,
    registry: &EntityRegistry,
    user_id: &str,
) -> TransferResult<ExportDocument> {
    let mut models = BTreeMap::new();
    for registration in registry.ordered() {
        let descriptor = &registration.descriptor;
        let records = descriptor.export_for_user(db, user_id).await?;
        debug!(
            entity_type = descriptor.type_name(),
            count = records.len(),
            "exported records"
        );
        models.insert(descriptor.type_name().to_string(), records);
    }

    Ok(ExportDocument {
        format_version: FORMAT_VERSION.to_string(),
        exported_at: Utc::now(),
        user: UserStub {
            id: user_id.to_string(),
        },
        models,
    })
}

/// Pack a document and its referenced uploads into a zip archive.
///
/// Bundled files land at human-readable paths
/// (`applications/<Company> - <Job Title> (<short id>)/resume.pdf`,
/// `.../rounds/01 - Phone Screen/<file>`), so an archive is navigable
/// without reading the JSON. Only files that resolve inside the upload root
/// are bundled; anything else is skipped, not an error. The user's email is
/// re-attached here, in the manifest only.
pub fn build_archive(
    document: &ExportDocument,
    registry: &EntityRegistry,
    store: &FileStore,
    user_email: Option<String>,
) -> TransferResult<Vec<u8>> {
    let data_json = serde_json::to_string_pretty(document)?;

    let mut files: BTreeMap<String, FileManifestEntry> = BTreeMap::new();
    let mut payloads: Vec<(String, Vec<u8>)> = Vec::new();
    let mut used_paths: HashSet<String> = HashSet::new();
    used_paths.insert("manifest.json".to_string());
    used_paths.insert("data.json".to_string());

    for registration in registry.ordered() {
        let descriptor = &registration.descriptor;
        let file_fields = descriptor.file_fields();
        if file_fields.is_empty() {
            continue;
        }
        let Some(records) = document.models.get(descriptor.type_name()) else {
            continue;
        };
        for value in records {
            let Some(record) = value.as_object() else {
                continue;
            };
            for field in file_fields {
                let Some(rel_path) = record.get(*field).and_then(JsonValue::as_str) else {
                    continue;
                };
                if rel_path.is_empty() {
                    continue;
                }
                let resolved = match store.resolve(rel_path) {
                    Ok(path) => path,
                    Err(err) => {
                        warn!(path = rel_path, error = %err, "skipping unresolvable upload");
                        continue;
                    }
                };
                let bytes = std::fs::read(&resolved)?;

                let Some(folder) = archive_folder(document, descriptor.type_name(), record)
                else {
                    continue;
                };
                let file_name = archive_file_name(record, field, rel_path);
                let archive_path = unique_path(&mut used_paths, format!("{}/{}", folder, file_name));

                let entity_id = record
                    .get("id")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                files.insert(
                    archive_path.clone(),
                    FileManifestEntry {
                        original_name: original_name_for(record, field, rel_path),
                        mime_type: detect::sniff_mime(&bytes).to_string(),
                        size_bytes: bytes.len() as u64,
                        sha256: content_hash(&bytes),
                        entity_type: descriptor.type_name().to_string(),
                        entity_id,
                        field: (*field).to_string(),
                    },
                );
                payloads.push((archive_path, bytes));
            }
        }
    }

    let counts = document
        .models
        .iter()
        .map(|(name, records)| (name.clone(), records.len()))
        .collect();
    let mut checksums = BTreeMap::new();
    checksums.insert(
        "data.json".to_string(),
        format!("sha256:{}", content_hash(data_json.as_bytes())),
    );

    let manifest = TransferManifest {
        format_version: document.format_version.clone(),
        export_timestamp: document.exported_at,
        user_id: document.user.id.clone(),
        user_email,
        counts,
        checksums,
        files,
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)?;

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("manifest.json", options)?;
        zip.write_all(manifest_json.as_bytes())?;

        zip.start_file("data.json", options)?;
        zip.write_all(data_json.as_bytes())?;

        for (path, bytes) in &payloads {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        zip.finish()?;
    }

    info!(
        user_id = %document.user.id,
        bundled_files = payloads.len(),
        "assembled export archive"
    );

    Ok(cursor.into_inner())
}

/// Keep a path component readable while dropping anything zip-hostile.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn application_folder(record: &Map<String, JsonValue>) -> String {
    let company = record
        .get("company")
        .and_then(JsonValue::as_str)
        .unwrap_or("Unknown");
    let title = record
        .get("job_title")
        .and_then(JsonValue::as_str)
        .unwrap_or("Unknown");
    let id = record.get("id").and_then(JsonValue::as_str).unwrap_or("id");
    format!(
        "applications/{} - {} ({})",
        sanitize_component(company),
        sanitize_component(title),
        short_id(id)
    )
}

fn find_record<'a>(
    document: &'a ExportDocument,
    type_name: &str,
    id: &str,
) -> Option<&'a Map<String, JsonValue>> {
    document.models.get(type_name)?.iter().find_map(|value| {
        let record = value.as_object()?;
        if record.get("id").and_then(JsonValue::as_str) == Some(id) {
            Some(record)
        } else {
            None
        }
    })
}

fn round_ordinal(document: &ExportDocument, round: &Map<String, JsonValue>) -> i64 {
    if let Some(seq) = round.get("sequence").and_then(JsonValue::as_i64) {
        return seq;
    }
    // No declared sequence: use the round's position among its siblings.
    let app_id = round.get("application_id").and_then(JsonValue::as_str);
    let round_id = round.get("id").and_then(JsonValue::as_str);
    let siblings = document
        .models
        .get("Round")
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let mut position = 0;
    for value in siblings {
        let Some(sibling) = value.as_object() else {
            continue;
        };
        if sibling.get("application_id").and_then(JsonValue::as_str) != app_id {
            continue;
        }
        position += 1;
        if sibling.get("id").and_then(JsonValue::as_str) == round_id {
            return position;
        }
    }
    position + 1
}

fn round_folder(document: &ExportDocument, round: &Map<String, JsonValue>) -> Option<String> {
    let app_id = round.get("application_id").and_then(JsonValue::as_str)?;
    let app = find_record(document, "Application", app_id)?;
    let type_name = round
        .get(&serializer::relation_key("round_type"))
        .and_then(JsonValue::as_object)
        .and_then(|t| t.get("name"))
        .and_then(JsonValue::as_str)
        .unwrap_or("Round");
    Some(format!(
        "{}/rounds/{:02} - {}",
        application_folder(app),
        round_ordinal(document, round),
        sanitize_component(type_name)
    ))
}

fn archive_folder(
    document: &ExportDocument,
    type_name: &str,
    record: &Map<String, JsonValue>,
) -> Option<String> {
    match type_name {
        "Application" => Some(application_folder(record)),
        "RoundMedia" => {
            let round_id = record.get("round_id").and_then(JsonValue::as_str)?;
            let round = find_record(document, "Round", round_id)?;
            round_folder(document, round)
        }
        _ => None,
    }
}

fn archive_file_name(record: &Map<String, JsonValue>, field: &str, rel_path: &str) -> String {
    if let Some(name) = record.get("original_name").and_then(JsonValue::as_str) {
        if !name.trim().is_empty() {
            return sanitize_component(name);
        }
    }
    let ext = std::path::Path::new(rel_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let stem = record
        .get("kind")
        .and_then(JsonValue::as_str)
        .unwrap_or_else(|| field.strip_suffix("_path").unwrap_or(field));
    format!("{}.{}", sanitize_component(stem), ext)
}

fn original_name_for(record: &Map<String, JsonValue>, field: &str, rel_path: &str) -> String {
    record
        .get("original_name")
        .and_then(JsonValue::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| archive_file_name(record, field, rel_path))
}

fn unique_path(used: &mut HashSet<String>, candidate: String) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let (stem, ext) = match candidate.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), Some(ext.to_string())),
        None => (candidate, None),
    };
    let mut n = 2;
    loop {
        let next = match &ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        if used.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}
