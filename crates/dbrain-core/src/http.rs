//! Shared plumbing for the HTTP adapters.

use std::time::Duration;

use crate::{errors::Error, retry::parse_retry_after, Result};

const ERROR_BODY_CHARS: usize = 200;

pub fn client(service: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("{service} http client: {e}")))
}

/// Turn a non-success response into a core error (429 → `RateLimited`).
pub async fn check_status(service: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = parse_retry_after(
            resp.headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        );
        return Err(Error::rate_limited(service, retry_after));
    }
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::External(format!(
        "{service} API error: {status} {}",
        body.chars().take(ERROR_BODY_CHARS).collect::<String>()
    )))
}
