use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::entities::{applications, status_events, statuses};
use crate::files::detect::{validate_file, DOCUMENT_TYPES};
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::{ApplicationInput, ApplicationService};

pub async fn list_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<applications::Model>>, StatusCode> {
    let items = ApplicationService::new(state.db.clone())
        .list(&user.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(items))
}

pub async fn create_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ApplicationInput>,
) -> Result<(StatusCode, Json<applications::Model>), StatusCode> {
    let created = ApplicationService::new(state.db.clone())
        .create(&user.id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<applications::Model>, StatusCode> {
    let application = ApplicationService::new(state.db.clone())
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(application))
}

pub async fn update_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ApplicationInput>,
) -> Result<Json<applications::Model>, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let updated = service
        .update(&user.id, &id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(updated))
}

pub async fn delete_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    service
        .delete(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status_id: String,
    pub note: Option<String>,
}

pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<applications::Model>, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    // The target status must exist for this user before the service runs.
    statuses::Entity::find_by_id(&payload.status_id)
        .filter(statuses::Column::UserId.eq(&user.id))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::BAD_REQUEST)?;

    let updated = service
        .change_status(&user.id, &id, &payload.status_id, payload.note)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(updated))
}

pub async fn list_status_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<status_events::Model>>, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let events = service
        .status_history(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(events))
}

/// Attach a resume or cover letter to an application. The file goes through
/// the content-addressed store; the column keeps the store-relative path.
pub async fn upload_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, field)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    let subdir = match field.as_str() {
        "resume" => "resumes",
        "cover_letter" => "cover_letters",
        _ => return Err(StatusCode::NOT_FOUND),
    };

    let application = ApplicationService::new(state.db.clone())
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if part.name().unwrap_or("") == "file" {
            file_name = part.file_name().map(|value| value.to_string());
            file_bytes = Some(
                part.bytes()
                    .await
                    .map_err(|_| StatusCode::BAD_REQUEST)?
                    .to_vec(),
            );
        }
    }
    let file_bytes = file_bytes.ok_or(StatusCode::BAD_REQUEST)?;

    let (allowed, mime_type) = validate_file(&file_bytes, DOCUMENT_TYPES);
    if !allowed {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    let stored_path = state
        .store
        .store(&file_bytes, subdir)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut active: applications::ActiveModel = application.into();
    match field.as_str() {
        "resume" => active.resume_path = Set(Some(stored_path.clone())),
        _ => active.cover_letter_path = Set(Some(stored_path.clone())),
    }
    active.updated_at = Set(chrono::Utc::now());
    active
        .update(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(json!({
        "path": stored_path,
        "original_name": file_name,
        "mime_type": mime_type,
        "size_bytes": file_bytes.len(),
    })))
}
