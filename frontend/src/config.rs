#[cfg(debug_assertions)]
pub fn get_track_endpoint() -> &'static str {
    "http://localhost:3000/api/track" // Development URL when running locally
}

#[cfg(not(debug_assertions))]
pub fn get_track_endpoint() -> &'static str {
    // Baked in at build time; same-origin API route by default
    match option_env!("TRACK_ENDPOINT") {
        Some(endpoint) => endpoint,
        None => "/api/track",
    }
}
