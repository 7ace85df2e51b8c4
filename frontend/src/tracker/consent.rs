use std::cell::Cell;
use std::rc::Rc;

use super::client_id::CookieJar;

pub const CONSENT_COOKIE: &str = "consent";

/// Whether PII may leave the browser. Absence of a signal resolves to
/// false. This is the client's best-effort filter only; the server makes
/// its own authoritative decision.
pub trait ConsentProvider {
    fn resolve(&self) -> bool;
}

/// Fixed answer, mostly for tests and embedders with their own CMP.
pub struct StaticConsent(pub bool);

impl ConsentProvider for StaticConsent {
    fn resolve(&self) -> bool {
        self.0
    }
}

/// Consent granted when the `consent` cookie is exactly "1".
pub struct CookieConsent<J: CookieJar> {
    jar: Rc<J>,
}

impl<J: CookieJar> CookieConsent<J> {
    pub fn new(jar: Rc<J>) -> Self {
        Self { jar }
    }
}

impl<J: CookieJar> ConsentProvider for CookieConsent<J> {
    fn resolve(&self) -> bool {
        self.jar.get(CONSENT_COOKIE).as_deref() == Some("1")
    }
}

/// An explicitly set flag wins over the inner provider. This replaces the
/// ambient `window.__consent` style of override with instance state.
pub struct ConsentOverride<C: ConsentProvider> {
    flag: Cell<Option<bool>>,
    inner: C,
}

impl<C: ConsentProvider> ConsentOverride<C> {
    pub fn new(inner: C) -> Self {
        Self {
            flag: Cell::new(None),
            inner,
        }
    }

    pub fn set(&self, value: Option<bool>) {
        self.flag.set(value);
    }
}

impl<C: ConsentProvider> ConsentProvider for ConsentOverride<C> {
    fn resolve(&self) -> bool {
        self.flag.get().unwrap_or_else(|| self.inner.resolve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::testutil::MemoryCookies;

    #[test]
    fn cookie_consent_requires_exact_value() {
        let jar = Rc::new(MemoryCookies::default());
        let consent = CookieConsent::new(jar.clone());

        assert!(!consent.resolve());
        jar.set(CONSENT_COOKIE, "yes", 1);
        assert!(!consent.resolve());
        jar.set(CONSENT_COOKIE, "1", 1);
        assert!(consent.resolve());
    }

    #[test]
    fn override_wins_over_cookie() {
        let jar = Rc::new(MemoryCookies::default());
        jar.set(CONSENT_COOKIE, "1", 1);
        let consent = ConsentOverride::new(CookieConsent::new(jar));

        assert!(consent.resolve());
        consent.set(Some(false));
        assert!(!consent.resolve());
        consent.set(None);
        assert!(consent.resolve());
    }
}
