use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};

use crate::files::sniff_mime;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;

/// Serve a stored blob by its store-relative path. Blobs are shared between
/// records, so access is gated on the session alone.
pub async fn download_file(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let bytes = state.store.read(&path).map_err(|err| {
        if err.is_not_found() || err.is_client_error() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    let mime = sniff_mime(&bytes);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    );
    Ok((headers, bytes))
}
