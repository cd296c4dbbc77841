use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::database::entities::job_leads;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::{LeadInput, LeadService};

pub async fn list_leads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<job_leads::Model>>, StatusCode> {
    let items = LeadService::new(state.db.clone())
        .list(&user.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(items))
}

pub async fn create_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<LeadInput>,
) -> Result<(StatusCode, Json<job_leads::Model>), StatusCode> {
    let created = LeadService::new(state.db.clone())
        .create(&user.id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<job_leads::Model>, StatusCode> {
    let lead = LeadService::new(state.db.clone())
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(lead))
}

pub async fn update_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<LeadInput>,
) -> Result<Json<job_leads::Model>, StatusCode> {
    let service = LeadService::new(state.db.clone());
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

pub async fn dismiss_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<job_leads::Model>, StatusCode> {
    let service = LeadService::new(state.db.clone());
    service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let updated = service
        .dismiss(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(updated))
}

/// Turn a lead into an application. The lead is kept in the converted state
/// so the source trail survives.
pub async fn convert_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let service = LeadService::new(state.db.clone());
    let lead = service
        .get(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    if lead.state == job_leads::STATE_CONVERTED {
        return Err(StatusCode::CONFLICT);
    }

    let (lead, application) = service
        .convert(&user.id, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "lead": lead,
            "application": application,
        })),
    ))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let service = LeadService::new(state.db.clone());
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
