use serde::Deserialize;

/// Event names the endpoint accepts. Anything else is rejected with
/// `invalid_event_name`.
pub const ALLOWED_EVENT_NAMES: [&str; 2] = ["af_link_click", "af_lead"];

pub const EVENT_LINK_CLICK: &str = "af_link_click";
pub const EVENT_LEAD: &str = "af_lead";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPii {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
}

/// The client-authored event as it arrives on the wire. Everything except
/// `event_name` is tolerated missing; the handler fills in defaults the same
/// way it treats an empty string.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingEvent {
    pub event_name: String,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(rename = "ref", default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub cta_id: Option<String>,
    #[serde(default)]
    pub form_type: Option<String>,
    /// Milliseconds since epoch, assigned client-side at event creation.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub pii: EventPii,
}

impl TrackingEvent {
    pub fn page_or_empty(&self) -> &str {
        self.page.as_deref().unwrap_or("")
    }

    pub fn form_type_or_empty(&self) -> &str {
        self.form_type.as_deref().unwrap_or("")
    }

    pub fn cta_id_or_empty(&self) -> &str {
        self.cta_id.as_deref().unwrap_or("")
    }

    pub fn client_id_or_empty(&self) -> &str {
        self.client_id.as_deref().unwrap_or("")
    }
}
