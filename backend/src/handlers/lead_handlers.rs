use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::lead_models::Lead;
use crate::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile"));

#[derive(Debug, Deserialize)]
struct LeadRequest {
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    phone: String,
    message: Option<String>,
    source: Option<String>,
}

fn bad(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": error }))).into_response()
}

fn clamp(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

pub async fn lead_preflight() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub async fn lead_method_not_allowed() -> Response {
    bad(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
}

/// POST /api/leads: validate the contact form, persist the lead, notify the
/// team by email and send the submitter a confirmation.
pub async fn submit_lead(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let headers = parts.headers;
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return bad(StatusCode::BAD_REQUEST, "invalid_json"),
    };
    let lead_request: LeadRequest = match serde_json::from_slice(&bytes) {
        Ok(parsed) => parsed,
        Err(_) => return bad(StatusCode::BAD_REQUEST, "invalid_json"),
    };

    let name = lead_request.name.unwrap_or_default();
    let email = lead_request.email.unwrap_or_default();
    let message = lead_request.message.unwrap_or_default();
    if name.is_empty() || email.is_empty() || message.is_empty() {
        return bad(StatusCode::UNPROCESSABLE_ENTITY, "missing_required_fields");
    }
    if !EMAIL_RE.is_match(&email) {
        return bad(StatusCode::UNPROCESSABLE_ENTITY, "invalid_email");
    }

    let client_ip = peer.map(|addr| addr.ip().to_string()).unwrap_or_else(|| {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    });
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let lead = Lead {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        name: clamp(&name, 200),
        email: clamp(&email, 200),
        phone: clamp(&lead_request.phone, 64),
        message: clamp(&message, 4000),
        source: lead_request.source.unwrap_or_else(|| "web".to_string()),
        client_ip,
        user_agent,
    };

    if let Err(err) = state.lead_repository.create_lead(&lead) {
        tracing::error!(error = %err, "failed to persist lead");
        return bad(StatusCode::INTERNAL_SERVER_ERROR, "storage_failed");
    }

    // Admin notification: failure here is a hard error, losing the lead
    // notification is worse than making the submitter retry.
    for recipient in &state.leads.notify_to {
        let subject = format!("New lead: {} - {}", lead.name, lead.source);
        if let Err(err) = state
            .email_sender
            .send(recipient, &subject, &notification_body(&lead))
        {
            tracing::error!(error = %err, %recipient, "failed to send lead notification");
            return bad(StatusCode::INTERNAL_SERVER_ERROR, "email_failed");
        }
    }

    // Confirmation to the submitter: best-effort only.
    if let Err(err) = state.email_sender.send(
        &lead.email,
        "Thank you for your inquiry",
        &confirmation_body(&lead),
    ) {
        tracing::warn!(error = %err, "failed to send lead confirmation email");
    }

    tracing::info!(lead_id = %lead.id, source = %lead.source, "lead captured");

    (
        StatusCode::OK,
        Json(json!({ "ok": true, "data": { "id": lead.id, "createdAt": lead.created_at } })),
    )
        .into_response()
}

fn notification_body(lead: &Lead) -> String {
    format!(
        "<div>\
            <h3>New lead submitted</h3>\
            <p><b>Time:</b> {}</p>\
            <p><b>Name:</b> {}</p>\
            <p><b>Email:</b> {}</p>\
            <p><b>Phone:</b> {}</p>\
            <p><b>Source:</b> {}</p>\
            <p><b>IP:</b> {}</p>\
            <p><b>Message:</b></p>\
            <pre style=\"white-space:pre-wrap\">{}</pre>\
        </div>",
        lead.created_at,
        escape_html(&lead.name),
        escape_html(&lead.email),
        escape_html(&lead.phone),
        escape_html(&lead.source),
        lead.client_ip,
        escape_html(&lead.message),
    )
}

fn confirmation_body(lead: &Lead) -> String {
    format!(
        "<div>\
            <h3>Dear {},</h3>\
            <p>Thank you for contacting us! We have received your inquiry and \
            will get back to you as soon as possible, typically within 24 hours.</p>\
            <p>Your message:</p>\
            <pre style=\"white-space:pre-wrap\">{}</pre>\
            <p>Best regards,<br>The team</p>\
        </div>",
        escape_html(&lead.name),
        escape_html(&lead.message),
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
