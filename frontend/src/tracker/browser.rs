//! Browser bindings: cookie access via `document.cookie`, delivery via
//! `fetch` with `keepalive`, and the auto-binding click listener. Only
//! compiled for wasm; the rest of the tracker is host-testable.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{DocumentReadyState, Element, Headers, HtmlDocument, MouseEvent, Request, RequestInit, Response};

use crate::config;

use super::client_id::CookieJar;
use super::consent::{ConsentOverride, CookieConsent};
use super::delivery::Transport;
use super::event::TrackingPii;
use super::platform::Platform;
use super::Tracker;

fn html_document() -> Option<HtmlDocument> {
    web_sys::window()?
        .document()?
        .dyn_into::<HtmlDocument>()
        .ok()
}

pub struct BrowserCookies;

impl CookieJar for BrowserCookies {
    fn get(&self, name: &str) -> Option<String> {
        let raw = html_document()?.cookie().ok()?;
        let prefix = format!("{}=", name);
        raw.split(';').map(str::trim).find_map(|pair| {
            pair.strip_prefix(prefix.as_str()).map(|value| {
                js_sys::decode_uri_component(value)
                    .map(String::from)
                    .unwrap_or_else(|_| value.to_string())
            })
        })
    }

    fn set(&self, name: &str, value: &str, max_age_days: u32) {
        let Some(document) = html_document() else {
            return;
        };
        let expires = js_sys::Date::new_0();
        expires.set_time(expires.get_time() + max_age_days as f64 * 24.0 * 60.0 * 60.0 * 1000.0);
        let cookie = format!(
            "{}={};expires={};path=/;SameSite=Lax",
            name,
            String::from(js_sys::encode_uri_component(value)),
            String::from(expires.to_utc_string()),
        );
        let _ = document.set_cookie(&cookie);
    }
}

pub struct BrowserPlatform;

impl Platform for BrowserPlatform {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn page(&self) -> String {
        web_sys::window()
            .and_then(|window| window.location().pathname().ok())
            .unwrap_or_else(|| "/".to_string())
    }

    fn referrer(&self) -> Option<String> {
        let referrer = web_sys::window()?.document()?.referrer();
        if referrer.is_empty() {
            None
        } else {
            Some(referrer)
        }
    }

    fn new_client_id(&self) -> String {
        if let Some(id) = web_sys::window()
            .and_then(|window| window.crypto().ok())
            .map(|crypto| crypto.random_uuid())
        {
            return id;
        }
        format!(
            "{}-{}-{}",
            js_sys::Date::now() as u64,
            random_fragment(),
            random_fragment()
        )
    }

    async fn sleep(&self, ms: u64) {
        gloo_timers::future::TimeoutFuture::new(ms as u32).await;
    }
}

/// Eight base-36 digits of Math.random(), the fallback id material when
/// crypto.randomUUID is unavailable.
fn random_fragment() -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut value = js_sys::Math::random();
    let mut out = String::with_capacity(8);
    for _ in 0..8 {
        value *= 36.0;
        let digit = (value as usize).min(35);
        out.push(DIGITS[digit] as char);
        value -= digit as f64;
    }
    out
}

fn js_error(err: JsValue) -> String {
    format!("{:?}", err)
}

pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn send(&self, endpoint: &str, body: &str, consent: bool) -> Result<u16, String> {
        let headers = Headers::new().map_err(js_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_error)?;
        headers
            .set("X-Consent", if consent { "1" } else { "0" })
            .map_err(js_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(headers.as_ref());
        init.set_body(&JsValue::from_str(body));
        // Let the request outlive page navigation.
        init.set_keepalive(true);

        let request = Request::new_with_str_and_init(endpoint, &init).map_err(js_error)?;
        let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let response: Response = response.dyn_into().map_err(js_error)?;
        Ok(response.status())
    }
}

type BrowserConsent = ConsentOverride<CookieConsent<BrowserCookies>>;
type BrowserTracker = Tracker<BrowserPlatform, BrowserCookies, BrowserConsent, FetchTransport>;

thread_local! {
    static TRACKER: RefCell<Option<Rc<BrowserTracker>>> = RefCell::new(None);
}

fn with_tracker(f: impl FnOnce(&BrowserTracker)) {
    TRACKER.with(|cell| {
        if cell.borrow().is_none() {
            let cookies = Rc::new(BrowserCookies);
            let consent = Rc::new(ConsentOverride::new(CookieConsent::new(cookies.clone())));
            let tracker = Tracker::new(
                config::get_track_endpoint(),
                Rc::new(BrowserPlatform),
                cookies,
                consent,
                Rc::new(FetchTransport),
            );
            *cell.borrow_mut() = Some(Rc::new(tracker));
        }
        let tracker = cell.borrow().as_ref().cloned();
        if let Some(tracker) = tracker {
            f(&tracker);
        }
    });
}

#[wasm_bindgen]
pub fn track_link_click(cta_id: &str) {
    with_tracker(|tracker| {
        if let Some(job) = tracker.track_link_click(cta_id) {
            spawn_local(async move {
                let _ = job.run().await;
            });
        }
    });
}

#[wasm_bindgen]
pub fn track_lead(
    form_type: &str,
    email: Option<String>,
    phone: Option<String>,
    name: Option<String>,
) {
    let pii = TrackingPii { email, phone, name };
    with_tracker(|tracker| {
        if let Some(job) = tracker.track_lead(form_type, Some(pii.clone())) {
            spawn_local(async move {
                let _ = job.run().await;
            });
        }
    });
}

/// Explicit consent signal from the cookie banner; overrides the consent
/// cookie until the page is reloaded.
#[wasm_bindgen]
pub fn set_consent(granted: bool) {
    with_tracker(|tracker| tracker.consent_provider().set(Some(granted)));
}

/// Attach a single capturing click listener that tracks marked elements:
/// anything matching `[data-track="jump"]` or the well-known `#jumpButton`.
pub fn init_tracker() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };

    let callback = Closure::wrap(Box::new(move |event: MouseEvent| {
        let Some(target) = event.target() else {
            return;
        };
        let Ok(element) = target.dyn_into::<Element>() else {
            return;
        };
        if let Ok(Some(tracked)) = element.closest("[data-track=\"jump\"], #jumpButton") {
            let cta_id = Some(tracked.id())
                .filter(|id| !id.is_empty())
                .or_else(|| tracked.get_attribute("data-id").filter(|v| !v.is_empty()))
                .unwrap_or_else(|| "unknown".to_string());
            track_link_click(&cta_id);
        }
    }) as Box<dyn FnMut(MouseEvent)>);

    let _ = document.add_event_listener_with_callback_and_bool(
        "click",
        callback.as_ref().unchecked_ref(),
        true,
    );
    callback.forget();
}

/// Runs at module load, deferring the DOM binding until the document has
/// finished parsing.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    if document.ready_state() == DocumentReadyState::Loading {
        let on_ready = Closure::wrap(Box::new(init_tracker) as Box<dyn FnMut()>);
        let _ = document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref());
        on_ready.forget();
    } else {
        init_tracker();
    }
}
