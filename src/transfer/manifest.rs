//! Archive document and manifest shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `data.json`: the versioned export document.
///
/// The user stub deliberately carries the id only; the email lives in the
/// manifest, where the archive-assembly caller re-attaches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub format_version: String,
    #[serde(alias = "export_timestamp")]
    pub exported_at: DateTime<Utc>,
    pub user: UserStub,
    pub models: BTreeMap<String, Vec<JsonValue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStub {
    pub id: String,
}

/// `manifest.json`: counts, payload checksum, and the bundled file listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferManifest {
    pub format_version: String,
    pub export_timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_email: Option<String>,
    pub counts: BTreeMap<String, usize>,
    /// Keyed by archive entry name; values are `sha256:<hex>`.
    pub checksums: BTreeMap<String, String>,
    /// Keyed by the bundled file's archive path.
    #[serde(default)]
    pub files: BTreeMap<String, FileManifestEntry>,
}

/// One bundled binary file: where it sits in the archive, what it is, and
/// which record field referenced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileManifestEntry {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub entity_type: String,
    pub entity_id: String,
    pub field: String,
}

/// Response of the validate endpoint. Validation never mutates state, so
/// problems come back as structured entries instead of errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub valid: bool,
    pub summary: ImportSummary,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub counts: BTreeMap<String, usize>,
    pub file_count: usize,
}

impl ImportPreview {
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            summary: ImportSummary::default(),
            warnings: Vec::new(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::FORMAT_VERSION;
    use serde_json::json;

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = ExportDocument {
            format_version: FORMAT_VERSION.to_string(),
            exported_at: Utc::now(),
            user: UserStub {
                id: "u1".to_string(),
            },
            models: BTreeMap::from([(
                "Application".to_string(),
                vec![json!({"id": "a1", "company": "Acme"})],
            )]),
        };

        let text = serde_json::to_string(&doc).expect("serialize");
        let parsed: ExportDocument = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed.format_version, FORMAT_VERSION);
        assert_eq!(parsed.models["Application"].len(), 1);
    }

    #[test]
    fn test_document_accepts_export_timestamp_alias() {
        let text = json!({
            "format_version": "1.0.0",
            "export_timestamp": "2024-06-01T00:00:00Z",
            "user": {"id": "u1"},
            "models": {}
        })
        .to_string();

        let parsed: ExportDocument = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed.user.id, "u1");
    }

    #[test]
    fn test_manifest_files_default_empty() {
        let text = json!({
            "format_version": "1.0.0",
            "export_timestamp": "2024-06-01T00:00:00Z",
            "user_id": "u1",
            "user_email": null,
            "counts": {},
            "checksums": {"data.json": "sha256:00"}
        })
        .to_string();

        let manifest: TransferManifest = serde_json::from_str(&text).expect("parse");
        assert!(manifest.files.is_empty());
        assert_eq!(
            manifest.checksums.get("data.json"),
            Some(&"sha256:00".to_string())
        );
    }
}
