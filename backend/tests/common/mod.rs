//! Shared test harness: in-memory database, capturing email sender, and a
//! local stand-in server for the AppsFlyer / Meta endpoints.

// Each test binary uses a different subset of this harness.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use axum_test::TestServer;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::MigrationHarness;
use serde_json::{json, Value};

use backend::config::leads::LeadsConfig;
use backend::config::tracking::{ConsentMode, TrackingConfig};
use backend::repositories::lead_repository::LeadRepository;
use backend::utils::email::{EmailError, EmailSender};
use backend::{create_router, AppState, DbPool, MIGRATIONS};

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email sender that records every message; optionally fails for one
/// recipient to exercise the best-effort paths.
#[derive(Clone, Default)]
pub struct MockEmailSender {
    pub sent: Arc<Mutex<Vec<SentEmail>>>,
    failing_recipient: Arc<Mutex<Option<String>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        *self.failing_recipient.lock().unwrap() = Some(recipient.to_string());
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|mail| mail.to == recipient)
            .cloned()
            .collect()
    }
}

impl EmailSender for MockEmailSender {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        if self.failing_recipient.lock().unwrap().as_deref() == Some(to) {
            return Err(EmailError::Failed("mock failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub path: String,
    pub authentication: Option<String>,
    pub query: Option<String>,
    pub body: Value,
}

/// Captures what the backend sends to the two ad vendors.
#[derive(Clone, Default)]
pub struct VendorCapture {
    pub calls: Arc<Mutex<Vec<CapturedCall>>>,
    pub fail_appsflyer: Arc<AtomicBool>,
}

impl VendorCapture {
    pub fn calls_to(&self, path_prefix: &str) -> Vec<CapturedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path.starts_with(path_prefix))
            .cloned()
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

async fn appsflyer_stub(
    State(capture): State<VendorCapture>,
    Path(app_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    capture.calls.lock().unwrap().push(CapturedCall {
        path: format!("/inappevent/{}", app_id),
        authentication: headers
            .get("authentication")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        query: None,
        body,
    });
    if capture.fail_appsflyer.load(Ordering::SeqCst) {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
    } else {
        (StatusCode::OK, Json(json!({ "ok": true })))
    }
}

async fn meta_stub(
    State(capture): State<VendorCapture>,
    Path(pixel_id): Path<String>,
    RawQuery(query): RawQuery,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    capture.calls.lock().unwrap().push(CapturedCall {
        path: format!("/{}/events", pixel_id),
        authentication: None,
        query,
        body,
    });
    (StatusCode::OK, Json(json!({ "events_received": 1 })))
}

pub async fn spawn_vendor_server(capture: VendorCapture) -> SocketAddr {
    let app = Router::new()
        .route("/inappevent/{app_id}", post(appsflyer_stub))
        .route("/{pixel_id}/events", post(meta_stub))
        .with_state(capture);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind vendor stub");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Vendor stub died");
    });
    addr
}

pub fn test_pool() -> DbPool {
    let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Failed to create pool");
    {
        let mut conn = pool.get().expect("Failed to get DB connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    }
    pool
}

pub fn tracking_config(vendor: SocketAddr) -> TrackingConfig {
    TrackingConfig {
        enabled: true,
        consent_mode: ConsentMode::Implicit,
        af_app_id: Some("app123".to_string()),
        af_dev_key: Some("devkey".to_string()),
        fb_pixel_id: Some("pixel1".to_string()),
        fb_access_token: Some("token-abc".to_string()),
        allowed_origins: vec![
            "https://www.itgiftcard.com".to_string(),
            "http://localhost:5173".to_string(),
        ],
        af_endpoint_base: format!("http://{}/inappevent", vendor),
        meta_endpoint_base: format!("http://{}", vendor),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub emails: MockEmailSender,
    pub vendor: VendorCapture,
    pub state: Arc<AppState>,
}

/// Build the app against the vendor stub, applying any tracking-config
/// tweaks the test needs.
pub async fn spawn_app(configure: impl FnOnce(&mut TrackingConfig)) -> TestApp {
    let vendor = VendorCapture::default();
    let vendor_addr = spawn_vendor_server(vendor.clone()).await;

    let mut tracking = tracking_config(vendor_addr);
    configure(&mut tracking);

    let pool = test_pool();
    let emails = MockEmailSender::new();
    let state = Arc::new(AppState {
        db_pool: pool.clone(),
        lead_repository: Arc::new(LeadRepository::new(pool)),
        email_sender: Arc::new(emails.clone()),
        http_client: reqwest::Client::new(),
        tracking,
        leads: LeadsConfig {
            notify_to: vec!["team@example.com".to_string()],
        },
    });

    let server = TestServer::new(create_router(state.clone())).expect("Failed to build TestServer");

    TestApp {
        server,
        emails,
        vendor,
        state,
    }
}
