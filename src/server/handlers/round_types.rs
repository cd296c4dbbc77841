use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::entities::round_types;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;

#[derive(Deserialize)]
pub struct RoundTypeRequest {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
}

pub async fn list_round_types(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<round_types::Model>>, StatusCode> {
    let items = round_types::Entity::find()
        .filter(round_types::Column::UserId.eq(&user.id))
        .order_by_asc(round_types::Column::SortOrder)
        .order_by_asc(round_types::Column::Name)
        .all(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(items))
}

pub async fn create_round_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RoundTypeRequest>,
) -> Result<(StatusCode, Json<round_types::Model>), StatusCode> {
    let name = payload
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;

    let round_type = round_types::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user.id.clone()),
        name: Set(name),
        sort_order: Set(payload.sort_order.unwrap_or(0)),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(chrono::Utc::now()),
    };
    let round_type = round_type
        .insert(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::CREATED, Json(round_type)))
}

pub async fn update_round_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RoundTypeRequest>,
) -> Result<Json<round_types::Model>, StatusCode> {
    let round_type = round_types::Entity::find_by_id(&id)
        .filter(round_types::Column::UserId.eq(&user.id))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut active: round_types::ActiveModel = round_type.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        active.name = Set(name);
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(updated))
}

pub async fn delete_round_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let round_type = round_types::Entity::find_by_id(&id)
        .filter(round_types::Column::UserId.eq(&user.id))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    round_types::Entity::delete_by_id(round_type.id)
        .exec(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(StatusCode::NO_CONTENT)
}
