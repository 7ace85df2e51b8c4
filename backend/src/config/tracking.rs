use std::env;

const DEFAULT_AF_ENDPOINT_BASE: &str = "https://api2.appsflyer.com/inappevent";
const DEFAULT_META_ENDPOINT_BASE: &str = "https://graph.facebook.com/v19.0";

fn get_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Server-side consent policy. The client's own consent gating is best-effort;
/// this decision is the enforcement point for whether PII gets hashed and
/// forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentMode {
    /// Consent assumed for every request.
    Implicit,
    /// Consent never granted, even with an explicit header.
    OptOut,
    /// Consent only with an explicit `X-Consent: 1` header.
    Strict,
}

impl ConsentMode {
    pub fn from_env_value(raw: &str) -> Self {
        match raw {
            "implicit" => ConsentMode::Implicit,
            "opt_out" => ConsentMode::OptOut,
            _ => ConsentMode::Strict,
        }
    }

    /// Whether consent holds given the request's `X-Consent: 1` header state.
    pub fn grants(&self, header_consent: bool) -> bool {
        *self != ConsentMode::OptOut && (*self == ConsentMode::Implicit || header_consent)
    }
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Global kill switch. When false the endpoint answers with
    /// `tracking_disabled` and performs no forwarding.
    pub enabled: bool,
    pub consent_mode: ConsentMode,
    pub af_app_id: Option<String>,
    pub af_dev_key: Option<String>,
    pub fb_pixel_id: Option<String>,
    pub fb_access_token: Option<String>,
    /// CORS allow-list. The first entry is the canonical origin that
    /// unrecognized origins fall back to.
    pub allowed_origins: Vec<String>,
    pub af_endpoint_base: String,
    pub meta_endpoint_base: String,
}

impl TrackingConfig {
    pub fn from_env() -> Self {
        let allowed_origins = get_env("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "https://www.itgiftcard.com".to_string(),
                    "http://localhost:5174".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        Self {
            enabled: env::var("TRACKING_ENABLED").as_deref() == Ok("true"),
            consent_mode: ConsentMode::from_env_value(
                env::var("CONSENT_MODE").as_deref().unwrap_or("implicit"),
            ),
            af_app_id: get_env("AF_APP_ID"),
            af_dev_key: get_env("AF_DEV_KEY"),
            fb_pixel_id: get_env("FB_PIXEL_ID"),
            fb_access_token: get_env("FB_ACCESS_TOKEN"),
            allowed_origins,
            af_endpoint_base: get_env("AF_ENDPOINT_BASE")
                .unwrap_or_else(|| DEFAULT_AF_ENDPOINT_BASE.to_string()),
            meta_endpoint_base: get_env("META_ENDPOINT_BASE")
                .unwrap_or_else(|| DEFAULT_META_ENDPOINT_BASE.to_string()),
        }
    }

    /// Resolve the origin to reflect in CORS headers: an exact allow-list
    /// match, or the canonical (first) entry for anything else.
    pub fn resolve_origin(&self, request_origin: Option<&str>) -> String {
        if let Some(origin) = request_origin {
            if self.allowed_origins.iter().any(|allowed| allowed == origin) {
                return origin.to_string();
            }
        }
        self.allowed_origins
            .first()
            .cloned()
            .unwrap_or_else(|| "*".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_origins(origins: &[&str]) -> TrackingConfig {
        TrackingConfig {
            enabled: true,
            consent_mode: ConsentMode::Implicit,
            af_app_id: None,
            af_dev_key: None,
            fb_pixel_id: None,
            fb_access_token: None,
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            af_endpoint_base: DEFAULT_AF_ENDPOINT_BASE.to_string(),
            meta_endpoint_base: DEFAULT_META_ENDPOINT_BASE.to_string(),
        }
    }

    #[test]
    fn known_origin_is_reflected() {
        let config = config_with_origins(&["https://a.example", "http://localhost:5173"]);
        assert_eq!(
            config.resolve_origin(Some("http://localhost:5173")),
            "http://localhost:5173"
        );
    }

    #[test]
    fn unknown_origin_falls_back_to_canonical() {
        let config = config_with_origins(&["https://a.example", "http://localhost:5173"]);
        assert_eq!(config.resolve_origin(Some("https://evil.example")), "https://a.example");
        assert_eq!(config.resolve_origin(None), "https://a.example");
    }

    #[test]
    fn implicit_mode_grants_without_header() {
        assert!(ConsentMode::Implicit.grants(false));
        assert!(ConsentMode::Implicit.grants(true));
    }

    #[test]
    fn strict_mode_requires_header() {
        assert!(!ConsentMode::Strict.grants(false));
        assert!(ConsentMode::Strict.grants(true));
    }

    #[test]
    fn opt_out_mode_ignores_header() {
        assert!(!ConsentMode::OptOut.grants(false));
        assert!(!ConsentMode::OptOut.grants(true));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(ConsentMode::from_env_value("implicit"), ConsentMode::Implicit);
        assert_eq!(ConsentMode::from_env_value("opt_out"), ConsentMode::OptOut);
        assert_eq!(ConsentMode::from_env_value("anything_else"), ConsentMode::Strict);
    }
}
