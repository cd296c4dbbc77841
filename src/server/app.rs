use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::files::FileStore;
use crate::transfer::{default_registry, EntityRegistry, ImportProgressTable};

use super::handlers::{
    applications, auth, files, health, leads, round_types, rounds, statuses, transfer,
};

/// Uploads and import archives can carry interview recordings, so the body
/// cap sits well above the default.
const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub store: FileStore,
    pub registry: Arc<EntityRegistry>,
    pub progress: Arc<ImportProgressTable>,
}

pub async fn create_app(db: DatabaseConnection, config: &ServerConfig) -> Result<Router> {
    let state = AppState {
        db,
        store: FileStore::new(config.upload_dir.clone()),
        registry: Arc::new(default_registry()),
        progress: Arc::new(ImportProgressTable::new()),
    };

    let cors = match config.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any)
            .allow_credentials(false),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any)
            .allow_credentials(false),
    };

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route(
            "/applications/:id",
            get(applications::get_application)
                .put(applications::update_application)
                .delete(applications::delete_application),
        )
        .route("/applications/:id/status", post(applications::change_status))
        .route("/applications/:id/events", get(applications::list_status_events))
        .route(
            "/applications/:id/files/:field",
            post(applications::upload_document),
        )
        .route(
            "/applications/:id/rounds",
            get(rounds::list_rounds).post(rounds::create_round),
        )
        .route(
            "/applications/:id/rounds/:round_id",
            put(rounds::update_round).delete(rounds::delete_round),
        )
        .route(
            "/rounds/:round_id/media",
            get(rounds::list_media).post(rounds::upload_media),
        )
        .route(
            "/statuses",
            get(statuses::list_statuses).post(statuses::create_status),
        )
        .route(
            "/statuses/:id",
            put(statuses::update_status).delete(statuses::delete_status),
        )
        .route(
            "/round-types",
            get(round_types::list_round_types).post(round_types::create_round_type),
        )
        .route(
            "/round-types/:id",
            put(round_types::update_round_type).delete(round_types::delete_round_type),
        )
        .route("/leads", get(leads::list_leads).post(leads::create_lead))
        .route(
            "/leads/:id",
            get(leads::get_lead).put(leads::update_lead).delete(leads::delete_lead),
        )
        .route("/leads/:id/dismiss", post(leads::dismiss_lead))
        .route("/leads/:id/convert", post(leads::convert_lead))
        .route("/files/*path", get(files::download_file))
        .route("/transfer/export", get(transfer::export_archive))
        .route("/transfer/validate", post(transfer::validate_archive))
        .route("/transfer/import", post(transfer::import_archive))
        .route(
            "/transfer/import/:import_id/progress",
            get(transfer::import_progress),
        );

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}
