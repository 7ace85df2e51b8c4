//! Conversion tracker: assembles events, suppresses duplicates, and hands
//! each survivor to a debounced, retrying delivery job. All collaborators
//! are injected so the whole pipeline runs under test without a browser.

pub mod client_id;
pub mod consent;
pub mod dedupe;
pub mod delivery;
pub mod event;
pub mod platform;

#[cfg(target_arch = "wasm32")]
pub mod browser;

use std::rc::Rc;

use self::client_id::{get_or_create_client_id, CookieJar};
use self::consent::ConsentProvider;
use self::dedupe::Deduplicator;
use self::delivery::{DeliveryConfig, DeliveryJob, Observer, Transport};
use self::event::{EventName, TrackingEvent, TrackingPii};
use self::platform::Platform;

pub struct Tracker<P, J, C, T> {
    platform: Rc<P>,
    cookies: Rc<J>,
    consent: Rc<C>,
    transport: Rc<T>,
    dedupe: Deduplicator,
    endpoint: String,
    delivery: DeliveryConfig,
    observer: Option<Observer>,
}

impl<P, J, C, T> Tracker<P, J, C, T>
where
    P: Platform,
    J: CookieJar,
    C: ConsentProvider,
    T: Transport,
{
    pub fn new(
        endpoint: impl Into<String>,
        platform: Rc<P>,
        cookies: Rc<J>,
        consent: Rc<C>,
        transport: Rc<T>,
    ) -> Self {
        Self {
            platform,
            cookies,
            consent,
            transport,
            dedupe: Deduplicator::default(),
            endpoint: endpoint.into(),
            delivery: DeliveryConfig::default(),
            observer: None,
        }
    }

    /// Hook invoked with the terminal outcome of every delivery job.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn consent_provider(&self) -> &Rc<C> {
        &self.consent
    }

    /// A CTA click. None when the event was deduplicated; otherwise the
    /// returned job still has to be driven to completion by the caller.
    pub fn track_link_click(&self, cta_id: &str) -> Option<DeliveryJob<P, C, T>> {
        self.submit(
            EventName::LinkClick,
            Some(cta_id.to_string()),
            None,
            None,
        )
    }

    /// A lead-form submission. PII travels with the event but is stripped
    /// at send time unless consent holds.
    pub fn track_lead(
        &self,
        form_type: &str,
        pii: Option<TrackingPii>,
    ) -> Option<DeliveryJob<P, C, T>> {
        self.submit(
            EventName::Lead,
            None,
            Some(form_type.to_string()),
            Some(pii.unwrap_or_default()),
        )
    }

    fn submit(
        &self,
        event_name: EventName,
        cta_id: Option<String>,
        form_type: Option<String>,
        pii: Option<TrackingPii>,
    ) -> Option<DeliveryJob<P, C, T>> {
        let client_id = get_or_create_client_id(&*self.cookies, &*self.platform);
        let event = TrackingEvent {
            event_name,
            page: self.platform.page(),
            referrer: self.platform.referrer(),
            cta_id,
            form_type,
            timestamp: self.platform.now_ms(),
            client_id,
            pii,
        };

        if self.dedupe.should_dedupe(&event.dedupe_key(), event.timestamp) {
            return None;
        }

        Some(DeliveryJob::new(
            event,
            self.endpoint.clone(),
            self.platform.clone(),
            self.consent.clone(),
            self.transport.clone(),
            self.delivery,
            self.observer.clone(),
        ))
    }
}
