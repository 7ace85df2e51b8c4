use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::api::{appsflyer, meta_capi};
use crate::models::tracking_models::{TrackingEvent, ALLOWED_EVENT_NAMES};
use crate::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

fn apply_cors(response: &mut Response, origin: &str) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("null")),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, x-consent"),
    );
}

fn with_cors(origin: &str, status: StatusCode, body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    apply_cors(&mut response, origin);
    response
}

fn bad(origin: &str, status: StatusCode, error: &str) -> Response {
    with_cors(origin, status, json!({ "ok": false, "error": error }))
}

fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::ORIGIN).and_then(|v| v.to_str().ok())
}

/// Client IP: connection info when the listener provides it, else the first
/// entry of x-forwarded-for, else empty.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("")
        .to_string()
}

/// CORS preflight: 204, empty body, reflected origin.
pub async fn track_preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let origin = state.tracking.resolve_origin(request_origin(&headers));
    let mut response = StatusCode::NO_CONTENT.into_response();
    apply_cors(&mut response, &origin);
    response
}

pub async fn track_method_not_allowed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let origin = state.tracking.resolve_origin(request_origin(&headers));
    bad(&origin, StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
}

/// POST /api/track: validate, enrich, hash PII under server-side consent,
/// fan out to AppsFlyer and Meta CAPI concurrently, report per-destination
/// outcome.
pub async fn track_event(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let headers = parts.headers;
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let origin = state.tracking.resolve_origin(request_origin(&headers));

    if !state.tracking.enabled {
        return with_cors(
            &origin,
            StatusCode::OK,
            json!({ "ok": true, "tracking_disabled": true }),
        );
    }

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return bad(&origin, StatusCode::BAD_REQUEST, "invalid_json"),
    };
    let event: TrackingEvent = match serde_json::from_slice(&bytes) {
        Ok(event) => event,
        Err(_) => return bad(&origin, StatusCode::BAD_REQUEST, "invalid_json"),
    };

    if !ALLOWED_EVENT_NAMES.contains(&event.event_name.as_str()) {
        return bad(&origin, StatusCode::BAD_REQUEST, "invalid_event_name");
    }

    let ip = client_ip(&headers, peer);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    // The client's X-Consent header is advisory; CONSENT_MODE decides.
    let header_consent = headers
        .get("x-consent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "1")
        .unwrap_or(false);
    let has_consent = state.tracking.consent_mode.grants(header_consent);

    let user_data = meta_capi::build_user_data(&event.pii, has_consent, &ip, &user_agent);

    let config = &state.tracking;
    let af_future = async {
        match (&config.af_app_id, &config.af_dev_key) {
            (Some(app_id), Some(dev_key)) => {
                let body = appsflyer::build_event(&event);
                Some(
                    appsflyer::send_event(
                        &state.http_client,
                        &config.af_endpoint_base,
                        app_id,
                        dev_key,
                        &body,
                    )
                    .await,
                )
            }
            _ => None,
        }
    };
    let meta_future = async {
        match (&config.fb_pixel_id, &config.fb_access_token) {
            (Some(pixel_id), Some(token)) => {
                let payload = meta_capi::build_payload(&event, user_data);
                Some(
                    meta_capi::send_event(
                        &state.http_client,
                        &config.meta_endpoint_base,
                        pixel_id,
                        token,
                        &payload,
                    )
                    .await,
                )
            }
            _ => None,
        }
    };
    // One slow destination must not delay the other; both are awaited before
    // responding, and each failure stays confined to its own result entry.
    let (af_result, meta_result) = tokio::join!(af_future, meta_future);

    tracing::info!(
        event_name = %event.event_name,
        page = %event.page_or_empty(),
        client_id = %event.client_id_or_empty(),
        has_consent,
        af_status = %summarize(&af_result),
        meta_status = %summarize(&meta_result),
        "tracking event processed"
    );

    with_cors(
        &origin,
        StatusCode::OK,
        json!({ "ok": true, "results": { "af": af_result, "meta": meta_result } }),
    )
}

fn summarize(result: &Option<Value>) -> String {
    match result {
        None => "skipped".to_string(),
        Some(value) => value
            .get("status")
            .and_then(Value::as_u64)
            .map(|status| status.to_string())
            .unwrap_or_else(|| "error".to_string()),
    }
}
