use std::env;

#[derive(Debug, Clone)]
pub struct LeadsConfig {
    /// Admin addresses that receive the new-lead notification email.
    /// Empty means no notification is sent.
    pub notify_to: Vec<String>,
}

impl LeadsConfig {
    pub fn from_env() -> Self {
        let notify_to = env::var("LEADS_NOTIFY_TO")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { notify_to }
    }
}
