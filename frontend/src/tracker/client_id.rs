use super::platform::Platform;

pub const CLIENT_ID_COOKIE: &str = "_cid";
pub const CLIENT_ID_TTL_DAYS: u32 = 365;

/// Cookie access. The browser implementation parses `document.cookie`;
/// tests use an in-memory map.
pub trait CookieJar {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, max_age_days: u32);
}

/// Stable per-browser visitor id: read the cookie, or mint one and persist
/// it for a year. Always returns an id; the only side effect is the cookie
/// write on first call.
pub fn get_or_create_client_id(jar: &impl CookieJar, platform: &impl Platform) -> String {
    if let Some(existing) = jar.get(CLIENT_ID_COOKIE) {
        return existing;
    }
    let id = platform.new_client_id();
    jar.set(CLIENT_ID_COOKIE, &id, CLIENT_ID_TTL_DAYS);
    id
}
