use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("{0}")]
    Failed(String),
}

pub trait EmailSender: Send + Sync {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError>;
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

impl SmtpConfig {
    /// Build from SMTP_HOST / SMTP_USERNAME / SMTP_PASSWORD / SMTP_FROM_EMAIL,
    /// with SMTP_PORT defaulting to 465. None when any required variable is
    /// missing, in which case the server falls back to console logging.
    pub fn from_env() -> Option<Self> {
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        Some(Self {
            host: get_env("SMTP_HOST")?,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(465),
            username: get_env("SMTP_USERNAME")?,
            password: get_env("SMTP_PASSWORD")?,
            from_email: get_env("SMTP_FROM_EMAIL")?,
        })
    }
}

pub struct SmtpEmailSender {
    transport: SmtpTransport,
    from_email: String,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        let creds = Credentials::new(config.username, config.password);
        let transport = SmtpTransport::relay(&config.host)?
            .port(config.port)
            .credentials(creds)
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP transport configured");

        Ok(Self {
            transport,
            from_email: config.from_email,
        })
    }
}

impl EmailSender for SmtpEmailSender {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from_email.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        self.transport.send(&message)?;
        Ok(())
    }
}

/// Used when SMTP is not configured, so local runs still show what would
/// have been sent.
pub struct ConsoleEmailSender;

impl EmailSender for ConsoleEmailSender {
    fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), EmailError> {
        tracing::info!(%to, %subject, "email (console sender, not delivered)");
        Ok(())
    }
}
