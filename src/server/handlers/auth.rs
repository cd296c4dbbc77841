use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::entities::{sessions, users};
use crate::errors::AuthError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::AuthService;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let service = AuthService::new(state.db.clone());
    let (user, session) = service
        .register(&payload.email, &payload.password, &payload.display_name)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(session_json(&user, &session))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let service = AuthService::new(state.db.clone());
    let (user, session) = service
        .login(&payload.email, &payload.password)
        .await
        .map_err(error_response)?;

    Ok(Json(session_json(&user, &session)))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(user_json(&user))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        AuthService::new(state.db.clone())
            .logout(token.trim())
            .await
            .map_err(error_response)?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// The account payload returned by auth endpoints. Never the raw model,
/// which would carry the password hash along.
fn user_json(user: &users::Model) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "display_name": user.display_name,
        "created_at": user.created_at,
    })
}

fn session_json(user: &users::Model, session: &sessions::Model) -> Value {
    json!({
        "token": session.id,
        "expires_at": session.expires_at,
        "user": user_json(user),
    })
}

fn error_response(err: AuthError) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.to_string(),
            "code": err.error_code(),
        })),
    )
}
