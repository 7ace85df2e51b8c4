/// Everything the tracker needs from its host environment: wall clock,
/// current page, referrer, id generation, and timers. The browser
/// implementation lives in [`super::browser`]; tests inject a fake.
#[allow(async_fn_in_trait)]
pub trait Platform {
    fn now_ms(&self) -> u64;

    fn page(&self) -> String;

    fn referrer(&self) -> Option<String>;

    /// A fresh client identifier: a random UUID where the platform has a
    /// secure generator, otherwise a timestamp plus random base-36 fragments.
    fn new_client_id(&self) -> String;

    async fn sleep(&self, ms: u64);
}
