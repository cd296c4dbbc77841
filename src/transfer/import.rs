//! Import engine: registry-order replay under fresh identifiers.

use std::collections::{BTreeMap, HashSet};

use sea_orm::{ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use serde_json::{Map, Value as JsonValue};
use tracing::{info, warn};

use crate::database::entities::{round_types, statuses};
use crate::errors::{TransferError, TransferResult};
use crate::files::store::{content_hash, FileStore};

use super::archive::{read_entry, read_json_entry, validate_archive};
use super::id_map::IdMap;
use super::manifest::{ImportPreview, ImportSummary, TransferManifest};
use super::progress::ImportProgressTable;
use super::registry::EntityRegistry;
use super::{FORMAT_VERSION, ORIGINAL_ID_KEY, USER_TYPE};

/// Check a parsed `data.json` for the supported version and a models map.
/// The version must match exactly; no cross-version import is attempted.
pub fn validate_document_shape(doc: &JsonValue) -> Result<(), String> {
    let Some(version) = doc.get("format_version").and_then(JsonValue::as_str) else {
        return Err("missing format_version".to_string());
    };
    if version != FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (expected {})",
            version, FORMAT_VERSION
        ));
    }
    match doc.get("models") {
        Some(JsonValue::Object(_)) => Ok(()),
        Some(_) => Err("models must be an object".to_string()),
        None => Err("missing models map".to_string()),
    }
}

/// Archive context for re-materializing bundled files during replay.
pub struct BundledFiles<'a> {
    pub archive: &'a [u8],
    pub manifest: &'a TransferManifest,
    pub store: &'a FileStore,
}

/// Replay a document's records in registry order inside one transaction.
///
/// Parents-before-children order is load-bearing: each child foreign key
/// must find its parent's fresh id already in the id map. The account type
/// is never replayed; every created row is attached to `user_id`. The
/// caller owns the transaction and commits once per import.
pub async fn import_user_data(
    txn: &DatabaseTransaction,
    registry: &EntityRegistry,
    doc: &JsonValue,
    user_id: &str,
    id_map: &mut IdMap,
    bundled: Option<&BundledFiles<'_>>,
    progress: Option<(&ImportProgressTable, &str)>,
) -> TransferResult<BTreeMap<String, usize>> {
    validate_document_shape(doc).map_err(TransferError::InvalidDocument)?;
    let models = doc
        .get("models")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| TransferError::InvalidDocument("missing models map".to_string()))?;

    let mut created: BTreeMap<String, usize> = BTreeMap::new();
    for registration in registry.ordered() {
        let descriptor = &registration.descriptor;
        let type_name = descriptor.type_name();
        if type_name == USER_TYPE {
            continue;
        }
        let Some(records) = models.get(type_name).and_then(JsonValue::as_array) else {
            continue;
        };
        if records.is_empty() {
            continue;
        }
        if let Some((table, import_id)) = progress {
            table.importing(import_id, type_name);
        }

        let mut count = 0;
        for value in records {
            let Some(record) = value.as_object() else {
                continue;
            };
            let mut record = record.clone();
            if let Some(bundled) = bundled {
                rematerialize_files(&mut record, type_name, descriptor.file_fields(), bundled)?;
            }
            let staged = descriptor
                .import_record(txn, &record, user_id, id_map)
                .await?;
            if let Some(original_id) = staged.original_id {
                id_map.add(type_name, &original_id, &staged.new_id);
            }
            count += 1;
        }

        created.insert(type_name.to_string(), count);
        if let Some((table, import_id)) = progress {
            table.record_created(import_id, type_name, count);
        }
    }

    Ok(created)
}

/// Re-point a record's file fields at freshly stored blobs.
///
/// Every manifest-declared file is re-hashed from the actual archive bytes
/// before it is trusted; a mismatch aborts the whole import. A field with no
/// manifest entry, or whose declared archive entry is absent, keeps its
/// original path.
fn rematerialize_files(
    record: &mut Map<String, JsonValue>,
    entity_type: &str,
    file_fields: &[&str],
    bundled: &BundledFiles<'_>,
) -> TransferResult<()> {
    let original_id = record
        .get(ORIGINAL_ID_KEY)
        .or_else(|| record.get("id"))
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();

    for field in file_fields {
        let Some(old_path) = record.get(*field).and_then(JsonValue::as_str) else {
            continue;
        };
        if old_path.is_empty() {
            continue;
        }

        let Some((archive_path, entry)) = bundled.manifest.files.iter().find(|(_, entry)| {
            entry.entity_type == entity_type
                && entry.entity_id == original_id
                && entry.field == *field
        }) else {
            continue;
        };

        let bytes = match read_entry(bundled.archive, archive_path) {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!(
                    path = archive_path.as_str(),
                    "declared file missing from archive, keeping original path"
                );
                continue;
            }
        };

        let actual = content_hash(&bytes);
        if actual != entry.sha256 {
            return Err(TransferError::ChecksumMismatch {
                path: archive_path.clone(),
                expected: entry.sha256.clone(),
                actual,
            });
        }

        let new_path = bundled.store.store(&bytes, subdir_for_field(field))?;
        record.insert((*field).to_string(), JsonValue::String(new_path));
    }
    Ok(())
}

fn subdir_for_field(field: &str) -> &'static str {
    match field {
        "resume_path" => "resumes",
        "cover_letter_path" => "cover_letters",
        "file_path" => "media",
        _ => "imported",
    }
}

fn verify_payload_checksum(manifest: &TransferManifest, data_bytes: &[u8]) -> TransferResult<()> {
    let Some(declared) = manifest.checksums.get("data.json") else {
        return Err(TransferError::InvalidDocument(
            "manifest is missing the data.json checksum".to_string(),
        ));
    };
    let expected = declared.strip_prefix("sha256:").unwrap_or(declared);
    let actual = content_hash(data_bytes);
    if expected != actual {
        return Err(TransferError::ChecksumMismatch {
            path: "data.json".to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Full import pipeline: safety scan, manifest and payload checksum checks,
/// shape validation, then a single-transaction replay. Any error rolls the
/// transaction back, leaving zero imported rows.
pub async fn run_import(
    db: &DatabaseConnection,
    registry: &EntityRegistry,
    store: &FileStore,
    archive_bytes: &[u8],
    user_id: &str,
    progress: &ImportProgressTable,
    import_id: &str,
) -> TransferResult<BTreeMap<String, usize>> {
    progress.start(import_id);
    validate_archive(archive_bytes)?;

    let manifest: TransferManifest =
        serde_json::from_value(read_json_entry(archive_bytes, "manifest.json")?).map_err(|err| {
            TransferError::InvalidDocument(format!("invalid manifest.json: {}", err))
        })?;
    let data_bytes = read_entry(archive_bytes, "data.json")?;
    verify_payload_checksum(&manifest, &data_bytes)?;

    let doc: JsonValue = serde_json::from_slice(&data_bytes).map_err(|err| {
        TransferError::InvalidDocument(format!("data.json is not valid JSON: {}", err))
    })?;
    validate_document_shape(&doc).map_err(TransferError::InvalidDocument)?;

    let bundled = BundledFiles {
        archive: archive_bytes,
        manifest: &manifest,
        store,
    };

    let txn = db.begin().await?;
    let mut id_map = IdMap::new();
    let created = import_user_data(
        &txn,
        registry,
        &doc,
        user_id,
        &mut id_map,
        Some(&bundled),
        Some((progress, import_id)),
    )
    .await?;
    txn.commit().await?;

    info!(user_id, import_id, "import committed");
    progress.complete(import_id, created.clone());
    Ok(created)
}

/// Inspect an archive without mutating anything.
///
/// Safety, shape, and checksum problems come back as `errors` entries in the
/// preview rather than as an `Err`; the validate endpoint answers with
/// structure, not a 5xx.
pub async fn preview_import(
    db: &DatabaseConnection,
    archive_bytes: &[u8],
    user_id: &str,
) -> ImportPreview {
    match build_preview(db, archive_bytes, user_id).await {
        Ok(preview) => preview,
        Err(err) => ImportPreview::invalid(vec![err.to_string()]),
    }
}

async fn build_preview(
    db: &DatabaseConnection,
    archive_bytes: &[u8],
    user_id: &str,
) -> TransferResult<ImportPreview> {
    validate_archive(archive_bytes)?;

    let manifest: TransferManifest =
        serde_json::from_value(read_json_entry(archive_bytes, "manifest.json")?).map_err(|err| {
            TransferError::InvalidDocument(format!("invalid manifest.json: {}", err))
        })?;
    let data_bytes = read_entry(archive_bytes, "data.json")?;
    verify_payload_checksum(&manifest, &data_bytes)?;

    let doc: JsonValue = serde_json::from_slice(&data_bytes).map_err(|err| {
        TransferError::InvalidDocument(format!("data.json is not valid JSON: {}", err))
    })?;
    validate_document_shape(&doc).map_err(TransferError::InvalidDocument)?;
    let models = doc
        .get("models")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| TransferError::InvalidDocument("missing models map".to_string()))?;

    let mut counts = BTreeMap::new();
    for (name, records) in models {
        counts.insert(
            name.clone(),
            records.as_array().map(Vec::len).unwrap_or(0),
        );
    }

    let mut errors = Vec::new();
    if let Some(apps) = models.get("Application").and_then(JsonValue::as_array) {
        for (index, value) in apps.iter().enumerate() {
            let Some(record) = value.as_object() else {
                continue;
            };
            for required in ["company", "job_title"] {
                let present = record
                    .get(required)
                    .and_then(JsonValue::as_str)
                    .map(|s| !s.trim().is_empty())
                    .unwrap_or(false);
                if !present {
                    errors.push(format!(
                        "Application record {} is missing required field \"{}\"",
                        index + 1,
                        required
                    ));
                }
            }
        }
    }

    let mut warnings = vec![
        "import is additive: existing data is kept and imported records are appended".to_string(),
    ];

    let existing_statuses: HashSet<String> = statuses::Entity::find()
        .filter(statuses::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|status| status.name)
        .collect();
    for name in names_in(models, "Status") {
        if !existing_statuses.contains(&name) {
            warnings.push(format!(
                "status \"{}\" does not exist yet and will be created",
                name
            ));
        }
    }

    let existing_round_types: HashSet<String> = round_types::Entity::find()
        .filter(round_types::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|round_type| round_type.name)
        .collect();
    for name in names_in(models, "RoundType") {
        if !existing_round_types.contains(&name) {
            warnings.push(format!(
                "round type \"{}\" does not exist yet and will be created",
                name
            ));
        }
    }

    Ok(ImportPreview {
        valid: errors.is_empty(),
        summary: ImportSummary {
            counts,
            file_count: manifest.files.len(),
        },
        warnings,
        errors,
    })
}

fn names_in(models: &Map<String, JsonValue>, type_name: &str) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(records) = models.get(type_name).and_then(JsonValue::as_array) {
        for value in records {
            if let Some(name) = value.get("name").and_then(JsonValue::as_str) {
                if !name.trim().is_empty() {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::manifest::FileManifestEntry;
    use chrono::Utc;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_shape_rejects_wrong_version() {
        let doc = json!({"format_version": "9.9.9", "models": {}});
        let reason = validate_document_shape(&doc).expect_err("rejected");
        assert!(reason.contains("version"));
    }

    #[test]
    fn test_shape_rejects_missing_version() {
        let doc = json!({"models": {}});
        let reason = validate_document_shape(&doc).expect_err("rejected");
        assert!(reason.contains("format_version"));
    }

    #[test]
    fn test_shape_rejects_bad_models() {
        let doc = json!({"format_version": FORMAT_VERSION, "models": []});
        assert!(validate_document_shape(&doc).is_err());

        let doc = json!({"format_version": FORMAT_VERSION});
        assert!(validate_document_shape(&doc).is_err());
    }

    #[test]
    fn test_shape_accepts_current_version() {
        let doc = json!({"format_version": FORMAT_VERSION, "models": {}});
        assert!(validate_document_shape(&doc).is_ok());
    }

    #[test]
    fn test_subdir_for_field() {
        assert_eq!(subdir_for_field("resume_path"), "resumes");
        assert_eq!(subdir_for_field("cover_letter_path"), "cover_letters");
        assert_eq!(subdir_for_field("file_path"), "media");
        assert_eq!(subdir_for_field("other"), "imported");
    }

    fn manifest_with_file(archive_path: &str, sha256: &str) -> TransferManifest {
        TransferManifest {
            format_version: FORMAT_VERSION.to_string(),
            export_timestamp: Utc::now(),
            user_id: "u1".to_string(),
            user_email: None,
            counts: BTreeMap::new(),
            checksums: BTreeMap::new(),
            files: BTreeMap::from([(
                archive_path.to_string(),
                FileManifestEntry {
                    original_name: "resume.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    size_bytes: 8,
                    sha256: sha256.to_string(),
                    entity_type: "Application".to_string(),
                    entity_id: "old-1".to_string(),
                    field: "resume_path".to_string(),
                },
            )]),
        }
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::FileOptions::default();
            for (name, data) in entries {
                writer.start_file(*name, options).expect("start entry");
                writer.write_all(data).expect("write entry");
            }
            writer.finish().expect("finish zip");
        }
        cursor.into_inner()
    }

    #[test]
    fn test_rematerialize_verifies_and_repoints() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        let payload = b"%PDF-1.4";
        let archive = zip_with(&[("applications/Acme (old-1)/resume.pdf", payload)]);
        let manifest =
            manifest_with_file("applications/Acme (old-1)/resume.pdf", &content_hash(payload));
        let bundled = BundledFiles {
            archive: &archive,
            manifest: &manifest,
            store: &store,
        };

        let mut record = json!({
            "__original_id__": "old-1",
            "id": "old-1",
            "resume_path": "resumes/stale.pdf"
        })
        .as_object()
        .cloned()
        .expect("object");

        rematerialize_files(&mut record, "Application", &["resume_path"], &bundled)
            .expect("rematerialized");

        let new_path = record["resume_path"].as_str().expect("path");
        assert!(new_path.starts_with("resumes/"));
        assert!(new_path.ends_with(".pdf"));
        assert_eq!(store.read(new_path).expect("stored"), payload);
    }

    #[test]
    fn test_rematerialize_rejects_checksum_mismatch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        let archive = zip_with(&[("applications/Acme (old-1)/resume.pdf", b"tampered bytes")]);
        let manifest = manifest_with_file(
            "applications/Acme (old-1)/resume.pdf",
            &content_hash(b"%PDF-1.4"),
        );
        let bundled = BundledFiles {
            archive: &archive,
            manifest: &manifest,
            store: &store,
        };

        let mut record = json!({
            "__original_id__": "old-1",
            "resume_path": "resumes/stale.pdf"
        })
        .as_object()
        .cloned()
        .expect("object");

        let err = rematerialize_files(&mut record, "Application", &["resume_path"], &bundled)
            .expect_err("mismatch");
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_rematerialize_keeps_path_when_file_not_bundled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        let archive = zip_with(&[("data.json", b"{}")]);
        let manifest = manifest_with_file("applications/gone.pdf", &content_hash(b"%PDF-1.4"));
        let bundled = BundledFiles {
            archive: &archive,
            manifest: &manifest,
            store: &store,
        };

        // Declared in the manifest but absent from the archive: degrade.
        let mut record = json!({
            "__original_id__": "old-1",
            "resume_path": "resumes/original.pdf"
        })
        .as_object()
        .cloned()
        .expect("object");
        rematerialize_files(&mut record, "Application", &["resume_path"], &bundled)
            .expect("kept going");
        assert_eq!(record["resume_path"], json!("resumes/original.pdf"));

        // Not declared in the manifest at all: same outcome.
        let mut record = json!({
            "__original_id__": "other-id",
            "resume_path": "resumes/original.pdf"
        })
        .as_object()
        .cloned()
        .expect("object");
        rematerialize_files(&mut record, "Application", &["resume_path"], &bundled)
            .expect("kept going");
        assert_eq!(record["resume_path"], json!("resumes/original.pdf"));
    }

    #[test]
    fn test_payload_checksum_verification() {
        let mut manifest = manifest_with_file("x", "00");
        manifest.checksums.insert(
            "data.json".to_string(),
            format!("sha256:{}", content_hash(b"{}")),
        );
        assert!(verify_payload_checksum(&manifest, b"{}").is_ok());

        let err = verify_payload_checksum(&manifest, b"{ }").expect_err("mismatch");
        assert!(err.to_string().contains("checksum mismatch"));

        manifest.checksums.clear();
        assert!(verify_payload_checksum(&manifest, b"{}").is_err());
    }
}
