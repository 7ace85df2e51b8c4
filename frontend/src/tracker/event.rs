use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventName {
    #[serde(rename = "af_link_click")]
    LinkClick,
    #[serde(rename = "af_lead")]
    Lead,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::LinkClick => "af_link_click",
            EventName::Lead => "af_lead",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackingPii {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A fully assembled event, ready for the wire.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingEvent {
    pub event_name: EventName,
    /// Current path, assigned at send time, never caller-supplied.
    pub page: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
    /// Milliseconds since epoch at event creation.
    pub timestamp: u64,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pii: Option<TrackingPii>,
}

impl TrackingEvent {
    pub fn dedupe_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.client_id,
            self.event_name.as_str(),
            self.cta_id.as_deref().unwrap_or("")
        )
    }
}
