use std::net::SocketAddr;
use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::MigrationHarness;
use dotenvy::dotenv;
use tracing::Level;

use backend::config::leads::LeadsConfig;
use backend::config::tracking::TrackingConfig;
use backend::repositories::lead_repository::LeadRepository;
use backend::utils::email::{ConsoleEmailSender, EmailSender, SmtpConfig, SmtpEmailSender};
use backend::{create_router, AppState, MIGRATIONS};

/// Warn about half-configured destinations early, instead of silently
/// skipping fan-out at request time.
fn validate_env(tracking: &TrackingConfig) {
    if tracking.af_app_id.is_some() != tracking.af_dev_key.is_some() {
        tracing::warn!("AF_APP_ID/AF_DEV_KEY only partially set, AppsFlyer fan-out disabled");
    }
    if tracking.fb_pixel_id.is_some() != tracking.fb_access_token.is_some() {
        tracing::warn!("FB_PIXEL_ID/FB_ACCESS_TOKEN only partially set, Meta fan-out disabled");
    }
    if !tracking.enabled {
        tracing::warn!("TRACKING_ENABLED is not 'true', /api/track runs with the kill switch on");
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Set up database connection pool
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "database.db".to_string());
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool");

    {
        let mut conn = pool.get().expect("Failed to get DB connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    }

    let tracking = TrackingConfig::from_env();
    validate_env(&tracking);

    let email_sender: Arc<dyn EmailSender> = match SmtpConfig::from_env() {
        Some(config) => Arc::new(
            SmtpEmailSender::new(config).expect("Failed to create SMTP transport"),
        ),
        None => {
            tracing::warn!("SMTP not configured, emails will be logged to the console");
            Arc::new(ConsoleEmailSender)
        }
    };

    let state = Arc::new(AppState {
        db_pool: pool.clone(),
        lead_repository: Arc::new(LeadRepository::new(pool)),
        email_sender,
        http_client: reqwest::Client::new(),
        tracking,
        leads: LeadsConfig::from_env(),
    });

    let app = create_router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
