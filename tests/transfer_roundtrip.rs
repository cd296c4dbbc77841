//! Export/import engine tests
//!
//! Exercises the archive pipeline end to end at the library level: document
//! assembly, archive packing, safety and checksum enforcement, and replay
//! under fresh identifiers.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use anyhow::Result;
use chrono::Utc;
use jobtrail::database::connection::setup_database;
use jobtrail::database::entities::{
    applications, round_media, round_types, rounds, status_events, statuses,
};
use jobtrail::errors::TransferError;
use jobtrail::files::store::content_hash;
use jobtrail::files::FileStore;
use jobtrail::services::{
    ApplicationInput, ApplicationService, AuthService, LeadInput, LeadService, RoundInput,
};
use jobtrail::transfer::archive::read_entry;
use jobtrail::transfer::{
    build_archive, default_registry, export_user_data, import_user_data, preview_import,
    run_import, IdMap, ImportPhase, ImportProgressTable, TransferManifest, FORMAT_VERSION,
    ORIGINAL_ID_KEY,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const RESUME_BYTES: &[u8] = b"%PDF-1.4 resume headed into the archive";
const MEDIA_BYTES: &[u8] = b"ID3\x04\x00recorded phone screen";

async fn setup_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let db_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", db_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, db_file))
}

fn setup_store() -> Result<(FileStore, TempDir)> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    Ok((store, dir))
}

struct Seeded {
    user_id: String,
    application_id: String,
    round_id: String,
    applied_status_id: String,
    resume_path: String,
    media_path: String,
}

/// Register an account and give it one application with status history, an
/// uploaded resume, a phone screen round with a recording, and a lead.
async fn seed_account(db: &DatabaseConnection, store: &FileStore, email: &str) -> Result<Seeded> {
    let (user, _session) = AuthService::new(db.clone())
        .register(email, "hunter2hunter2", "Seed User")
        .await?;

    let service = ApplicationService::new(db.clone());
    let application = service
        .create(
            &user.id,
            ApplicationInput {
                company: Some("Acme".to_string()),
                job_title: Some("Platform Engineer".to_string()),
                ..Default::default()
            },
        )
        .await?;

    let applied = statuses::Entity::find()
        .filter(statuses::Column::UserId.eq(&user.id))
        .filter(statuses::Column::Name.eq("Applied"))
        .one(db)
        .await?
        .expect("registration seeds an Applied status");
    let application = service
        .change_status(&user.id, &application.id, &applied.id, Some("sent".to_string()))
        .await?;

    let resume_path = store.store(RESUME_BYTES, "resumes")?;
    let mut active: applications::ActiveModel = application.clone().into();
    active.resume_path = Set(Some(resume_path.clone()));
    let application = active.update(db).await?;

    let phone_screen = round_types::Entity::find()
        .filter(round_types::Column::UserId.eq(&user.id))
        .filter(round_types::Column::Name.eq("Phone Screen"))
        .one(db)
        .await?
        .expect("registration seeds a Phone Screen round type");
    let round = service
        .add_round(
            &user.id,
            &application.id,
            RoundInput {
                round_type_id: Some(phone_screen.id.clone()),
                ..Default::default()
            },
        )
        .await?;

    let media_path = store.store(MEDIA_BYTES, "media")?;
    round_media::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        round_id: Set(round.id.clone()),
        kind: Set(round_media::KIND_RECORDING.to_string()),
        file_path: Set(media_path.clone()),
        original_name: Set(Some("call.mp3".to_string())),
        mime_type: Set(Some("audio/mpeg".to_string())),
        size_bytes: Set(Some(MEDIA_BYTES.len() as i64)),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    LeadService::new(db.clone())
        .create(
            &user.id,
            LeadInput {
                company: Some("Globex".to_string()),
                job_title: Some("SRE".to_string()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Seeded {
        user_id: user.id,
        application_id: application.id,
        round_id: round.id,
        applied_status_id: applied.id,
        resume_path,
        media_path,
    })
}

/// Register a second, empty account to import into.
async fn empty_account(db: &DatabaseConnection, email: &str) -> Result<String> {
    let (user, _session) = AuthService::new(db.clone())
        .register(email, "hunter2hunter2", "Importer")
        .await?;
    Ok(user.id)
}

/// Rebuild an archive, replacing the contents of one named entry.
fn replace_entry(original: &[u8], target: &str, new_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        let options = FileOptions::default();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            if name == target {
                data = new_bytes.to_vec();
            }
            writer.start_file(name, options)?;
            writer.write_all(&data)?;
        }
        writer.finish()?;
    }
    Ok(cursor.into_inner())
}

/// Rewrite data.json with a different format version, keeping the manifest
/// checksum consistent so only the version gate trips.
fn retarget_version(original: &[u8], version: &str) -> Result<Vec<u8>> {
    let mut doc: Value = serde_json::from_slice(&read_entry(original, "data.json")?)?;
    doc["format_version"] = json!(version);
    let new_data = serde_json::to_vec_pretty(&doc)?;

    let mut manifest: Value = serde_json::from_slice(&read_entry(original, "manifest.json")?)?;
    manifest["checksums"]["data.json"] = json!(format!("sha256:{}", content_hash(&new_data)));
    let new_manifest = serde_json::to_vec_pretty(&manifest)?;

    let step = replace_entry(original, "data.json", &new_data)?;
    replace_entry(&step, "manifest.json", &new_manifest)
}

#[tokio::test]
async fn test_export_document_shape() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "exporter@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;

    assert_eq!(document.format_version, FORMAT_VERSION);
    assert_eq!(document.user.id, seeded.user_id);

    let type_names: Vec<&str> = document.models.keys().map(String::as_str).collect();
    assert_eq!(
        type_names,
        vec![
            "Application",
            "JobLead",
            "Profile",
            "Round",
            "RoundMedia",
            "RoundType",
            "Status",
            "StatusEvent",
            "User",
        ]
    );

    // The account record carries no credential material.
    let user_record = &document.models["User"][0];
    assert_eq!(user_record["email"], "exporter@example.com");
    assert!(user_record.get("password_hash").is_none());
    assert_eq!(user_record[ORIGINAL_ID_KEY], seeded.user_id.as_str());

    // One level of relationship expansion on the application.
    let app_record = &document.models["Application"][0];
    assert_eq!(app_record["company"], "Acme");
    assert_eq!(app_record[ORIGINAL_ID_KEY], seeded.application_id.as_str());
    assert_eq!(app_record["related_status"]["name"], "Applied");
    assert_eq!(app_record["related_rounds"].as_array().unwrap().len(), 1);

    let round_record = &document.models["Round"][0];
    assert_eq!(round_record["related_round_type"]["name"], "Phone Screen");
    assert_eq!(round_record["related_media"].as_array().unwrap().len(), 1);

    let event_record = &document.models["StatusEvent"][0];
    assert_eq!(event_record["related_status"]["name"], "Applied");
    assert_eq!(event_record["note"], "sent");

    assert_eq!(document.models["Profile"].len(), 0);
    assert_eq!(document.models["Status"].len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_archive_layout_and_manifest() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "packer@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive =
        build_archive(&document, &registry, &store, Some("packer@example.com".to_string()))?;

    let short_id: String = seeded.application_id.chars().take(8).collect();
    let resume_entry = format!(
        "applications/Acme - Platform Engineer ({})/resume.pdf",
        short_id
    );
    let media_entry = format!(
        "applications/Acme - Platform Engineer ({})/rounds/01 - Phone Screen/call.mp3",
        short_id
    );

    let mut zip = ZipArchive::new(Cursor::new(archive.as_slice()))?;
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).map(|e| e.name().to_string()))
        .collect::<Result<_, _>>()?;
    assert!(names.contains(&"manifest.json".to_string()));
    assert!(names.contains(&"data.json".to_string()));
    assert!(names.contains(&resume_entry), "missing {}", resume_entry);
    assert!(names.contains(&media_entry), "missing {}", media_entry);

    // Bundled bytes are the stored blobs, not re-encoded copies.
    assert_eq!(read_entry(&archive, &resume_entry)?, RESUME_BYTES);
    assert_eq!(read_entry(&archive, &media_entry)?, MEDIA_BYTES);

    let manifest: TransferManifest =
        serde_json::from_slice(&read_entry(&archive, "manifest.json")?)?;
    assert_eq!(manifest.format_version, FORMAT_VERSION);
    assert_eq!(manifest.user_id, seeded.user_id);
    assert_eq!(manifest.user_email.as_deref(), Some("packer@example.com"));
    assert_eq!(manifest.counts["Application"], 1);
    assert_eq!(manifest.counts["Status"], 5);
    assert_eq!(manifest.counts["Profile"], 0);

    let data_bytes = read_entry(&archive, "data.json")?;
    assert_eq!(
        manifest.checksums["data.json"],
        format!("sha256:{}", content_hash(&data_bytes))
    );

    let resume_manifest = &manifest.files[&resume_entry];
    assert_eq!(resume_manifest.entity_type, "Application");
    assert_eq!(resume_manifest.entity_id, seeded.application_id);
    assert_eq!(resume_manifest.field, "resume_path");
    assert_eq!(resume_manifest.mime_type, "application/pdf");
    assert_eq!(resume_manifest.sha256, content_hash(RESUME_BYTES));
    assert_eq!(resume_manifest.size_bytes, RESUME_BYTES.len() as u64);

    let media_manifest = &manifest.files[&media_entry];
    assert_eq!(media_manifest.entity_type, "RoundMedia");
    assert_eq!(media_manifest.field, "file_path");
    assert_eq!(media_manifest.original_name, "call.mp3");

    Ok(())
}

#[tokio::test]
async fn test_round_trip_into_fresh_account() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "origin@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;

    // The serialized document lists types alphabetically; replay order comes
    // from the registry, so a child-before-parent document layout is fine.
    let data_text = String::from_utf8(read_entry(&archive, "data.json")?)?;
    let app_pos = data_text.find("\"Application\"").expect("Application key");
    let status_pos = data_text.find("\"Status\"").expect("Status key");
    assert!(app_pos < status_pos);

    let importer_id = empty_account(&db, "importer@example.com").await?;
    let progress = ImportProgressTable::new();
    let created = run_import(
        &db,
        &registry,
        &store,
        &archive,
        &importer_id,
        &progress,
        "imp-1",
    )
    .await?;

    assert_eq!(
        created,
        BTreeMap::from([
            ("Application".to_string(), 1),
            ("JobLead".to_string(), 1),
            ("Round".to_string(), 1),
            ("RoundMedia".to_string(), 1),
            ("RoundType".to_string(), 5),
            ("Status".to_string(), 5),
            ("StatusEvent".to_string(), 1),
        ])
    );

    // Fresh primary keys, forced ownership.
    let imported_apps = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert_eq!(imported_apps.len(), 1);
    let imported = &imported_apps[0];
    assert_ne!(imported.id, seeded.application_id);
    assert_eq!(imported.company.as_deref(), Some("Acme"));

    // status_id was remapped to the imported copy of "Applied".
    let imported_status_id = imported.status_id.as_deref().expect("remapped status");
    assert_ne!(imported_status_id, seeded.applied_status_id);
    let pointed = statuses::Entity::find_by_id(imported_status_id)
        .one(&db)
        .await?
        .expect("imported status row");
    assert_eq!(pointed.user_id, importer_id);
    assert_eq!(pointed.name, "Applied");

    // Child rows hang off the fresh ids.
    let imported_rounds = rounds::Entity::find()
        .filter(rounds::Column::ApplicationId.eq(&imported.id))
        .all(&db)
        .await?;
    assert_eq!(imported_rounds.len(), 1);
    let imported_round = &imported_rounds[0];
    assert_ne!(imported_round.id, seeded.round_id);
    let round_type_id = imported_round.round_type_id.as_deref().expect("remapped type");
    let imported_type = round_types::Entity::find_by_id(round_type_id)
        .one(&db)
        .await?
        .expect("imported round type row");
    assert_eq!(imported_type.user_id, importer_id);
    assert_eq!(imported_type.name, "Phone Screen");

    let imported_media = round_media::Entity::find()
        .filter(round_media::Column::RoundId.eq(&imported_round.id))
        .all(&db)
        .await?;
    assert_eq!(imported_media.len(), 1);
    assert_eq!(store.read(&imported_media[0].file_path)?, MEDIA_BYTES);

    let imported_events = status_events::Entity::find()
        .filter(status_events::Column::ApplicationId.eq(&imported.id))
        .all(&db)
        .await?;
    assert_eq!(imported_events.len(), 1);
    assert_eq!(imported_events[0].status_id.as_deref(), Some(imported_status_id));

    // Bundled files were re-verified and re-stored.
    assert_eq!(
        store.read(imported.resume_path.as_deref().expect("resume path"))?,
        RESUME_BYTES
    );

    // The exporting account is untouched.
    let original_apps = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&seeded.user_id))
        .all(&db)
        .await?;
    assert_eq!(original_apps.len(), 1);
    assert_eq!(original_apps[0].id, seeded.application_id);

    Ok(())
}

#[tokio::test]
async fn test_import_into_same_account_is_additive() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "self@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;

    let progress = ImportProgressTable::new();
    run_import(
        &db,
        &registry,
        &store,
        &archive,
        &seeded.user_id,
        &progress,
        "imp-self",
    )
    .await?;

    // Nothing is merged or de-duplicated: the account now holds both copies.
    let apps = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&seeded.user_id))
        .all(&db)
        .await?;
    assert_eq!(apps.len(), 2);
    let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
    assert!(ids.contains(&seeded.application_id.as_str()));

    let status_count = statuses::Entity::find()
        .filter(statuses::Column::UserId.eq(&seeded.user_id))
        .all(&db)
        .await?
        .len();
    assert_eq!(status_count, 10);

    // Identical bytes resolve to the same blob: still exactly one resume file.
    let resume_blobs = std::fs::read_dir(uploads.path().join("resumes"))?.count();
    assert_eq!(resume_blobs, 1);

    Ok(())
}

#[tokio::test]
async fn test_tampered_bundled_file_rolls_everything_back() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "victim@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;

    let short_id: String = seeded.application_id.chars().take(8).collect();
    let resume_entry = format!(
        "applications/Acme - Platform Engineer ({})/resume.pdf",
        short_id
    );
    let tampered = replace_entry(&archive, &resume_entry, b"%PDF-1.4 swapped in transit")?;

    let importer_id = empty_account(&db, "careful@example.com").await?;
    let progress = ImportProgressTable::new();
    let err = run_import(
        &db,
        &registry,
        &store,
        &tampered,
        &importer_id,
        &progress,
        "imp-tampered",
    )
    .await
    .expect_err("tampered file must abort the import");
    assert!(matches!(err, TransferError::ChecksumMismatch { .. }));

    // Statuses replay before applications, so rows were already staged when
    // the mismatch hit; the rollback must erase them all.
    let statuses_after = statuses::Entity::find()
        .filter(statuses::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert_eq!(statuses_after.len(), 5);
    let apps_after = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert!(apps_after.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_tampered_payload_is_rejected() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "payload@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;

    let mut doc: Value = serde_json::from_slice(&read_entry(&archive, "data.json")?)?;
    doc["models"]["Application"][0]["company"] = json!("Mallory Inc");
    let tampered = replace_entry(&archive, "data.json", &serde_json::to_vec_pretty(&doc)?)?;

    let importer_id = empty_account(&db, "wary@example.com").await?;
    let progress = ImportProgressTable::new();
    let err = run_import(
        &db,
        &registry,
        &store,
        &tampered,
        &importer_id,
        &progress,
        "imp-payload",
    )
    .await
    .expect_err("edited payload must abort the import");

    match err {
        TransferError::ChecksumMismatch { path, .. } => assert_eq!(path, "data.json"),
        other => panic!("expected checksum mismatch, got {}", other),
    }

    let apps_after = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert!(apps_after.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unsupported_version_is_rejected() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "future@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;
    let from_the_future = retarget_version(&archive, "9.9.9")?;

    let importer_id = empty_account(&db, "present@example.com").await?;
    let progress = ImportProgressTable::new();
    let err = run_import(
        &db,
        &registry,
        &store,
        &from_the_future,
        &importer_id,
        &progress,
        "imp-future",
    )
    .await
    .expect_err("version gate");
    assert!(err.to_string().contains("unsupported format version 9.9.9"));

    let preview = preview_import(&db, &from_the_future, &importer_id).await;
    assert!(!preview.valid);
    assert!(preview.errors[0].contains("9.9.9"));

    Ok(())
}

#[tokio::test]
async fn test_garbage_bytes_never_touch_the_database() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let importer_id = empty_account(&db, "lucky@example.com").await?;

    let registry = default_registry();
    let progress = ImportProgressTable::new();
    let err = run_import(
        &db,
        &registry,
        &store,
        b"definitely not a zip",
        &importer_id,
        &progress,
        "imp-garbage",
    )
    .await
    .expect_err("not an archive");
    assert!(matches!(err, TransferError::UnsafeArchive(_)));
    assert!(err.to_string().contains("invalid archive"));

    let apps = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert!(apps.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_import_ignores_unknown_types_and_columns() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let importer_id = empty_account(&db, "tolerant@example.com").await?;

    let doc = json!({
        "format_version": FORMAT_VERSION,
        "models": {
            "Widget": [{"id": "w1", "name": "not a tracker type"}],
            "Application": [{
                "__original_id__": "old-app",
                "id": "old-app",
                "user_id": "someone-else",
                "company": "Acme",
                "job_title": "Engineer",
                "frobnicate": true
            }]
        }
    });

    let registry = default_registry();
    let mut id_map = IdMap::new();
    let txn = db.begin().await?;
    let created =
        import_user_data(&txn, &registry, &doc, &importer_id, &mut id_map, None, None).await?;
    txn.commit().await?;

    assert_eq!(created, BTreeMap::from([("Application".to_string(), 1)]));
    assert!(id_map.get("Application", "old-app").is_some());

    let apps = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert_eq!(apps.len(), 1);
    // Ownership always lands on the importing account, whatever the record
    // claimed.
    assert_eq!(apps[0].user_id, importer_id);
    assert_ne!(apps[0].id, "old-app");
    assert_eq!(apps[0].company.as_deref(), Some("Acme"));

    Ok(())
}

#[tokio::test]
async fn test_import_remaps_declared_foreign_keys() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let importer_id = empty_account(&db, "remap@example.com").await?;

    let doc = json!({
        "format_version": FORMAT_VERSION,
        "models": {
            "Status": [{
                "__original_id__": "old-status",
                "id": "old-status",
                "name": "Imported Status",
                "sort_order": 7,
                "is_terminal": false
            }],
            "Application": [{
                "__original_id__": "old-app",
                "id": "old-app",
                "company": "Acme",
                "job_title": "Engineer",
                "status_id": "old-status"
            }]
        }
    });

    let registry = default_registry();
    let mut id_map = IdMap::new();
    let txn = db.begin().await?;
    import_user_data(&txn, &registry, &doc, &importer_id, &mut id_map, None, None).await?;
    txn.commit().await?;

    let fresh_status_id = id_map
        .get("Status", "old-status")
        .expect("status mapping recorded")
        .to_string();
    assert_ne!(fresh_status_id, "old-status");

    let apps = applications::Entity::find()
        .filter(applications::Column::UserId.eq(&importer_id))
        .all(&db)
        .await?;
    assert_eq!(apps[0].status_id.as_deref(), Some(fresh_status_id.as_str()));

    Ok(())
}

#[tokio::test]
async fn test_export_scopes_to_one_account() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let first = seed_account(&db, &store, "first@example.com").await?;
    let second = seed_account(&db, &store, "second@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &first.user_id).await?;

    assert_eq!(document.models["User"].len(), 1);
    assert_eq!(document.models["User"][0]["email"], "first@example.com");
    assert_eq!(document.models["Application"].len(), 1);
    assert_eq!(
        document.models["Application"][0][ORIGINAL_ID_KEY],
        first.application_id.as_str()
    );
    assert_eq!(document.models["Status"].len(), 5);
    for record in &document.models["Status"] {
        assert_eq!(record["user_id"], first.user_id.as_str());
    }

    let other = export_user_data(&db, &registry, &second.user_id).await?;
    assert_eq!(
        other.models["Application"][0][ORIGINAL_ID_KEY],
        second.application_id.as_str()
    );

    Ok(())
}

#[tokio::test]
async fn test_preview_counts_warnings_and_required_fields() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "previewer@example.com").await?;

    // One custom status so the preview has something the importer lacks.
    statuses::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(seeded.user_id.clone()),
        name: Set("Ghosted".to_string()),
        color: Set(None),
        sort_order: Set(9),
        is_terminal: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;

    let importer_id = empty_account(&db, "receiver@example.com").await?;
    let preview = preview_import(&db, &archive, &importer_id).await;

    assert!(preview.valid);
    assert!(preview.errors.is_empty());
    assert_eq!(preview.summary.counts["Application"], 1);
    assert_eq!(preview.summary.counts["Status"], 6);
    assert_eq!(preview.summary.file_count, 2);
    assert!(preview.warnings.iter().any(|w| w.contains("additive")));
    assert!(preview
        .warnings
        .iter()
        .any(|w| w.contains("\"Ghosted\" does not exist yet")));
    // The importer already has the five default names.
    assert!(!preview.warnings.iter().any(|w| w.contains("\"Applied\"")));

    // A record missing a required field turns the preview invalid.
    let mut doc: Value = serde_json::from_slice(&read_entry(&archive, "data.json")?)?;
    doc["models"]["Application"][0]["company"] = json!("");
    let new_data = serde_json::to_vec_pretty(&doc)?;
    let mut manifest: Value = serde_json::from_slice(&read_entry(&archive, "manifest.json")?)?;
    manifest["checksums"]["data.json"] = json!(format!("sha256:{}", content_hash(&new_data)));
    let step = replace_entry(&archive, "data.json", &new_data)?;
    let broken = replace_entry(&step, "manifest.json", &serde_json::to_vec_pretty(&manifest)?)?;

    let preview = preview_import(&db, &broken, &importer_id).await;
    assert!(!preview.valid);
    assert!(preview
        .errors
        .iter()
        .any(|e| e.contains("Application record 1 is missing required field \"company\"")));

    Ok(())
}

#[tokio::test]
async fn test_progress_reflects_import_lifecycle() -> Result<()> {
    let (db, _db_file) = setup_db().await?;
    let (store, _uploads) = setup_store()?;
    let seeded = seed_account(&db, &store, "tracked@example.com").await?;

    let registry = default_registry();
    let document = export_user_data(&db, &registry, &seeded.user_id).await?;
    let archive = build_archive(&document, &registry, &store, None)?;

    let importer_id = empty_account(&db, "watcher@example.com").await?;
    let progress = ImportProgressTable::new();
    let created = run_import(
        &db,
        &registry,
        &store,
        &archive,
        &importer_id,
        &progress,
        "imp-watched",
    )
    .await?;

    let entry = progress.get("imp-watched").expect("tracked entry");
    assert_eq!(entry.phase, ImportPhase::Completed);
    assert_eq!(entry.created, created);
    assert!(entry.error.is_none());

    assert!(progress.get("imp-unknown").is_none());

    Ok(())
}
