// Shared HTTP client for identity and orchestration calls
use std::time::Duration;
use uptime_core::{AppError, Result};

const USER_AGENT: &str = concat!("heat-uptime/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by the resolver and the probe
///
/// `timeout` bounds each request end to end, so a stalled endpoint can hold
/// a firing for at most that long.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {e}")))
}

/// Join an endpoint and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Trim a response body for inclusion in an error message
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
