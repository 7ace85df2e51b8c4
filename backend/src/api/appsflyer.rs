use chrono::{SecondsFormat, TimeZone, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::tracking_models::TrackingEvent;

#[derive(Debug, Serialize)]
pub struct InAppEvent {
    pub appsflyer_id: String,
    pub customer_user_id: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    /// ISO-8601 with milliseconds, e.g. "2023-11-14T22:13:20.000Z".
    #[serde(rename = "eventTime")]
    pub event_time: String,
    #[serde(rename = "eventValue")]
    pub event_value: EventValue,
}

#[derive(Debug, Serialize)]
pub struct EventValue {
    pub page: String,
    pub form_type: String,
    pub cta_id: String,
}

pub fn build_event(event: &TrackingEvent) -> InAppEvent {
    let event_time = event
        .timestamp
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    InAppEvent {
        appsflyer_id: event.client_id_or_empty().to_string(),
        customer_user_id: event.client_id_or_empty().to_string(),
        event_name: event.event_name.clone(),
        event_time,
        event_value: EventValue {
            page: event.page_or_empty().to_string(),
            form_type: event.form_type_or_empty().to_string(),
            cta_id: event.cta_id_or_empty().to_string(),
        },
    }
}

/// POST the in-app event to AppsFlyer. The returned value is the
/// per-destination entry of the response envelope: `{status, ok}` on any
/// HTTP response, `{error}` when the request itself failed.
pub async fn send_event(
    client: &Client,
    endpoint_base: &str,
    app_id: &str,
    dev_key: &str,
    body: &InAppEvent,
) -> Value {
    let url = format!("{}/{}", endpoint_base, app_id);
    match client
        .post(&url)
        .header("authentication", dev_key)
        .json(body)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            json!({ "status": status.as_u16(), "ok": status.is_success() })
        }
        Err(err) => json!({ "error": err.to_string() }),
    }
}
