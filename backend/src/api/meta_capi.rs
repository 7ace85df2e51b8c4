use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::tracking_models::{EventPii, TrackingEvent, EVENT_LEAD};
use crate::utils::pii::hash_pii;

#[derive(Debug, Serialize)]
pub struct UserData {
    /// Hashed email, present only under consent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<Vec<String>>,
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Vec<String>>,
    pub client_ip_address: String,
    pub client_user_agent: String,
}

#[derive(Debug, Serialize)]
pub struct CustomData {
    pub page: String,
    pub form_type: String,
    pub cta_id: String,
}

#[derive(Debug, Serialize)]
pub struct CapiEvent {
    pub event_name: String,
    /// Unix seconds.
    pub event_time: i64,
    pub action_source: String,
    pub user_data: UserData,
    pub custom_data: CustomData,
}

#[derive(Debug, Serialize)]
pub struct CapiPayload {
    pub data: Vec<CapiEvent>,
}

/// Map to Meta's standard events: a lead submission is `Lead`, any other
/// accepted event is contact intent.
pub fn standard_event_name(event_name: &str) -> &'static str {
    if event_name == EVENT_LEAD {
        "Lead"
    } else {
        "Contact"
    }
}

/// Hash PII into Meta's user_data. Hashing happens only under consent;
/// without it the payload carries just IP and user agent.
pub fn build_user_data(
    pii: &EventPii,
    has_consent: bool,
    client_ip: &str,
    user_agent: &str,
) -> UserData {
    let hash_field = |value: &Option<String>| -> Option<Vec<String>> {
        if !has_consent {
            return None;
        }
        value
            .as_deref()
            .and_then(hash_pii)
            .map(|digest| vec![digest])
    };

    UserData {
        em: hash_field(&pii.email),
        ph: hash_field(&pii.phone),
        first_name: hash_field(&pii.name),
        client_ip_address: client_ip.to_string(),
        client_user_agent: user_agent.to_string(),
    }
}

pub fn build_payload(event: &TrackingEvent, user_data: UserData) -> CapiPayload {
    let event_time = event
        .timestamp
        .map(|ms| ms / 1000)
        .unwrap_or_else(|| Utc::now().timestamp());

    CapiPayload {
        data: vec![CapiEvent {
            event_name: standard_event_name(&event.event_name).to_string(),
            event_time,
            action_source: "website".to_string(),
            user_data,
            custom_data: CustomData {
                page: event.page_or_empty().to_string(),
                form_type: event.form_type_or_empty().to_string(),
                cta_id: event.cta_id_or_empty().to_string(),
            },
        }],
    }
}

/// POST the event batch to the pixel's Conversions API endpoint. Echoes
/// `events_received` from Meta's response when it parses.
pub async fn send_event(
    client: &Client,
    endpoint_base: &str,
    pixel_id: &str,
    access_token: &str,
    payload: &CapiPayload,
) -> Value {
    let url = format!(
        "{}/{}/events?access_token={}",
        endpoint_base, pixel_id, access_token
    );
    match client.post(&url).json(payload).send().await {
        Ok(response) => {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_else(|_| json!({}));
            let mut result = json!({ "status": status.as_u16(), "ok": status.is_success() });
            if let Some(received) = body.get("events_received") {
                result["events_received"] = received.clone();
            }
            result
        }
        Err(err) => json!({ "error": err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pii() -> EventPii {
        EventPii {
            email: Some("A@B.com".to_string()),
            phone: Some("+1 555-123".to_string()),
            name: None,
        }
    }

    #[test]
    fn maps_event_names_to_standard_events() {
        assert_eq!(standard_event_name("af_lead"), "Lead");
        assert_eq!(standard_event_name("af_link_click"), "Contact");
    }

    #[test]
    fn consent_gates_all_hashed_fields() {
        let data = build_user_data(&pii(), false, "1.2.3.4", "UA");
        assert!(data.em.is_none());
        assert!(data.ph.is_none());
        assert!(data.first_name.is_none());
        assert_eq!(data.client_ip_address, "1.2.3.4");

        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("em").is_none());
        assert!(value.get("ph").is_none());
        assert!(value.get("fn").is_none());
    }

    #[test]
    fn consented_fields_are_hashed_and_absent_fields_omitted() {
        let data = build_user_data(&pii(), true, "1.2.3.4", "UA");
        assert_eq!(data.em, Some(vec![hash_pii("a@b.com").unwrap()]));
        assert!(data.ph.is_some());
        // name was never supplied, so no fn field
        assert!(data.first_name.is_none());
    }

    #[test]
    fn payload_uses_unix_seconds_and_website_source() {
        let event: TrackingEvent = serde_json::from_str(
            r#"{"event_name": "af_lead", "timestamp": 1700000000000}"#,
        )
        .unwrap();
        let payload = build_payload(&event, build_user_data(&EventPii::default(), true, "", ""));
        assert_eq!(payload.data[0].event_time, 1700000000);
        assert_eq!(payload.data[0].event_name, "Lead");
        assert_eq!(payload.data[0].action_source, "website");
    }
}
