use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::errors::TransferError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::transfer::{
    build_archive, export_user_data, preview_import, run_import, ImportPreview, ImportProgress,
};

/// Export the signed-in user's whole tracker as a zip archive.
pub async fn export_archive(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let document = export_user_data(&state.db, &state.registry, &user.id)
        .await
        .map_err(error_response)?;
    let bytes = build_archive(
        &document,
        &state.registry,
        &state.store,
        Some(user.email.clone()),
    )
    .map_err(error_response)?;

    let filename = format!("jobtrail-export-{}.zip", Utc::now().format("%Y%m%d"));
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)).map_err(
            |_| {
                error_response(TransferError::ExportFailed(
                    "could not build response headers".to_string(),
                ))
            },
        )?,
    );
    Ok((headers, bytes))
}

/// Inspect an uploaded archive without importing it. Problems come back in
/// the preview body, not as an error status.
pub async fn validate_archive(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Json<ImportPreview> {
    Json(preview_import(&state.db, &body, &user.id).await)
}

/// Import an uploaded archive into the signed-in account.
pub async fn import_archive(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let import_id = Uuid::new_v4().to_string();
    match run_import(
        &state.db,
        &state.registry,
        &state.store,
        &body,
        &user.id,
        &state.progress,
        &import_id,
    )
    .await
    {
        Ok(created) => Ok(Json(json!({
            "import_id": import_id,
            "created": created,
        }))),
        Err(err) => {
            error!(import_id = import_id.as_str(), "import failed: {}", err);
            state.progress.fail(&import_id, &err.to_string());
            Err(error_response(err))
        }
    }
}

pub async fn import_progress(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(import_id): Path<String>,
) -> Result<Json<ImportProgress>, StatusCode> {
    state
        .progress
        .get(&import_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

fn error_response(err: TransferError) -> (StatusCode, Json<Value>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({
            "error": err.to_string(),
            "code": err.error_code(),
        })),
    )
}
