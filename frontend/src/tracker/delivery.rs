use std::rc::Rc;

use super::consent::ConsentProvider;
use super::event::{TrackingEvent, TrackingPii};
use super::platform::Platform;

pub const DEBOUNCE_MS: u64 = 300;
pub const MAX_RETRIES: u32 = 2;
pub const RETRY_DELAY_MS: u64 = 1000;

/// POSTs a serialized event to the tracking endpoint. The consent flag is
/// carried as the `X-Consent` header. Returns the HTTP status, or Err for
/// transport-level failures.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, endpoint: &str, body: &str, consent: bool) -> Result<u16, String>;
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryConfig {
    pub debounce_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            max_retries: MAX_RETRIES,
            retry_delay_ms: RETRY_DELAY_MS,
        }
    }
}

/// Terminal state of a delivery attempt. Failures never propagate to the
/// caller; this exists so tests and metrics hooks can observe them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { status: u16, attempts: u32 },
    Dropped { attempts: u32 },
}

pub type Observer = Rc<dyn Fn(&TrackingEvent, &DeliveryOutcome)>;

/// One scheduled send: flat debounce, consent-gated PII strip, then up to
/// `1 + max_retries` attempts with linearly growing delay between them.
pub struct DeliveryJob<P, C, T> {
    event: TrackingEvent,
    endpoint: String,
    platform: Rc<P>,
    consent: Rc<C>,
    transport: Rc<T>,
    config: DeliveryConfig,
    observer: Option<Observer>,
}

impl<P: Platform, C: ConsentProvider, T: Transport> DeliveryJob<P, C, T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        event: TrackingEvent,
        endpoint: String,
        platform: Rc<P>,
        consent: Rc<C>,
        transport: Rc<T>,
        config: DeliveryConfig,
        observer: Option<Observer>,
    ) -> Self {
        Self {
            event,
            endpoint,
            platform,
            consent,
            transport,
            config,
            observer,
        }
    }

    pub async fn run(mut self) -> DeliveryOutcome {
        self.platform.sleep(self.config.debounce_ms).await;

        // Consent is resolved at send time, not when the event was queued.
        let consent = self.consent.resolve();
        if !consent {
            self.event.pii = Some(TrackingPii::default());
        }
        let body = serde_json::to_string(&self.event).unwrap_or_else(|_| "{}".to_string());

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match self.transport.send(&self.endpoint, &body, consent).await {
                Ok(status) if (200..300).contains(&status) => {
                    break DeliveryOutcome::Delivered {
                        status,
                        attempts: attempt,
                    };
                }
                result => {
                    if attempt > self.config.max_retries {
                        match result {
                            Ok(status) => log::warn!(
                                "tracking delivery dropped after {} attempts (HTTP {})",
                                attempt,
                                status
                            ),
                            Err(err) => log::warn!(
                                "tracking delivery dropped after {} attempts: {}",
                                attempt,
                                err
                            ),
                        }
                        break DeliveryOutcome::Dropped { attempts: attempt };
                    }
                    self.platform
                        .sleep(self.config.retry_delay_ms * attempt as u64)
                        .await;
                }
            }
        };

        if let Some(observer) = &self.observer {
            observer(&self.event, &outcome);
        }
        outcome
    }
}
