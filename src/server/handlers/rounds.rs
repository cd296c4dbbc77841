use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use crate::database::entities::{round_media, rounds};
use crate::files::detect::{validate_file, MEDIA_TYPES};
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::{ApplicationService, RoundInput};

pub async fn list_rounds(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<rounds::Model>>, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let items = service
        .list_rounds(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(items))
}

pub async fn create_round(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RoundInput>,
) -> Result<(StatusCode, Json<rounds::Model>), StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let created = service
        .add_round(&user.id, &id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_round(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, round_id)): Path<(String, String)>,
    Json(payload): Json<RoundInput>,
) -> Result<Json<rounds::Model>, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    let round = service
        .get_round(&user.id, &round_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    if round.application_id != id {
        return Err(StatusCode::NOT_FOUND);
    }

    let updated = service
        .update_round(&user.id, &round_id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(updated))
}

pub async fn delete_round(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, round_id)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    let round = service
        .get_round(&user.id, &round_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    if round.application_id != id {
        return Err(StatusCode::NOT_FOUND);
    }

    service
        .delete_round(&user.id, &round_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_media(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(round_id): Path<String>,
) -> Result<Json<Vec<round_media::Model>>, StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get_round(&user.id, &round_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let items = service
        .list_round_media(&user.id, &round_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(items))
}

/// Attach a recording or transcript to a round. The `kind` form field is
/// optional; absent, it is inferred from the sniffed content type.
pub async fn upload_media(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(round_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<round_media::Model>), StatusCode> {
    let service = ApplicationService::new(state.db.clone());
    service
        .get_round(&user.id, &round_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut kind: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        match part.name().unwrap_or("") {
            "kind" => {
                kind = Some(part.text().await.unwrap_or_default());
            }
            "file" => {
                file_name = part.file_name().map(|value| value.to_string());
                file_bytes = Some(
                    part.bytes()
                        .await
                        .map_err(|_| StatusCode::BAD_REQUEST)?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }
    let file_bytes = file_bytes.ok_or(StatusCode::BAD_REQUEST)?;

    let (allowed, mime_type) = validate_file(&file_bytes, MEDIA_TYPES);
    if !allowed {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    let kind = match kind.as_deref() {
        Some(round_media::KIND_RECORDING) => round_media::KIND_RECORDING,
        Some(round_media::KIND_TRANSCRIPT) => round_media::KIND_TRANSCRIPT,
        Some(_) => return Err(StatusCode::BAD_REQUEST),
        None if mime_type.starts_with("audio/") || mime_type.starts_with("video/") => {
            round_media::KIND_RECORDING
        }
        None => round_media::KIND_TRANSCRIPT,
    };

    let stored_path = state
        .store
        .store(&file_bytes, "media")
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let media = round_media::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        round_id: Set(round_id),
        kind: Set(kind.to_string()),
        file_path: Set(stored_path),
        original_name: Set(file_name),
        mime_type: Set(Some(mime_type.to_string())),
        size_bytes: Set(Some(file_bytes.len() as i64)),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(chrono::Utc::now()),
    };
    let media = media
        .insert(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(media)))
}
