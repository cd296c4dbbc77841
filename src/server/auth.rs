use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};

use crate::database::entities::users;
use crate::errors::AuthError;
use crate::services::AuthService;

use super::app::AppState;

/// The authenticated user, resolved from the `Authorization: Bearer` header.
pub struct CurrentUser(pub users::Model);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;
        let user = AuthService::new(state.db.clone())
            .authenticate(&token)
            .await
            .map_err(|err| match err {
                AuthError::Database(_) | AuthError::Hashing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::UNAUTHORIZED,
            })?;
        Ok(CurrentUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}
