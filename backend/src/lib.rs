use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod config {
    pub mod leads;
    pub mod tracking;
}
pub mod handlers {
    pub mod lead_handlers;
    pub mod track_handlers;
}
pub mod api {
    pub mod appsflyer;
    pub mod meta_capi;
}
pub mod models {
    pub mod lead_models;
    pub mod tracking_models;
}
pub mod repositories {
    pub mod lead_repository;
}
pub mod utils {
    pub mod email;
    pub mod pii;
}
pub mod schema;

use config::leads::LeadsConfig;
use config::tracking::TrackingConfig;
use handlers::{lead_handlers, track_handlers};
use repositories::lead_repository::LeadRepository;
use utils::email::EmailSender;

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub struct AppState {
    pub db_pool: DbPool,
    pub lead_repository: Arc<LeadRepository>,
    pub email_sender: Arc<dyn EmailSender>,
    pub http_client: reqwest::Client,
    pub tracking: TrackingConfig,
    pub leads: LeadsConfig,
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/track",
            post(track_handlers::track_event)
                .options(track_handlers::track_preflight)
                .fallback(track_handlers::track_method_not_allowed),
        )
        .route(
            "/api/leads",
            post(lead_handlers::submit_lead)
                .options(lead_handlers::lead_preflight)
                .fallback(lead_handlers::lead_method_not_allowed),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
