use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::entities::statuses;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;

#[derive(Deserialize)]
pub struct StatusRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
    pub is_terminal: Option<bool>,
}

pub async fn list_statuses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<statuses::Model>>, StatusCode> {
    let items = statuses::Entity::find()
        .filter(statuses::Column::UserId.eq(&user.id))
        .order_by_asc(statuses::Column::SortOrder)
        .order_by_asc(statuses::Column::Name)
        .all(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(items))
}

pub async fn create_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<StatusRequest>,
) -> Result<(StatusCode, Json<statuses::Model>), StatusCode> {
    let name = payload
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;

    let status = statuses::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user.id.clone()),
        name: Set(name),
        color: Set(payload.color),
        sort_order: Set(payload.sort_order.unwrap_or(0)),
        is_terminal: Set(payload.is_terminal.unwrap_or(false)),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(chrono::Utc::now()),
    };
    let status = status
        .insert(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<statuses::Model>, StatusCode> {
    let status = statuses::Entity::find_by_id(&id)
        .filter(statuses::Column::UserId.eq(&user.id))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut active: statuses::ActiveModel = status.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        active.name = Set(name);
    }
    if let Some(color) = payload.color {
        active.color = Set(Some(color));
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    if let Some(is_terminal) = payload.is_terminal {
        active.is_terminal = Set(is_terminal);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(updated))
}

pub async fn delete_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let status = statuses::Entity::find_by_id(&id)
        .filter(statuses::Column::UserId.eq(&user.id))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    // Applications and events referencing this status fall back to NULL.
    statuses::Entity::delete_by_id(status.id)
        .exec(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(StatusCode::NO_CONTENT)
}
