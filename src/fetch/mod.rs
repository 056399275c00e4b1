//! Retrieval of remote telemetry logs.

mod api_key;
mod basic;
mod client;

pub use api_key::ApiKey;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// True when `source` is an `http://` or `https://` URL rather than a file path.
pub fn is_remote(source: &str) -> bool {
    let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Issues a GET for `url` through `client` and returns the body.
///
/// Non-success HTTP statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid URL '{url}'"))?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Fetched log");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote_urls() {
        assert!(is_remote("http://fleet.example/logs/1.json"));
        assert!(is_remote("https://fleet.example/logs/1.json"));
        assert!(is_remote("HTTPS://fleet.example/logs/1.json"));
    }

    #[test]
    fn test_is_remote_local_paths() {
        assert!(!is_remote("http_dump.json"));
        assert!(!is_remote("https_logs/vin1.json"));
        assert!(!is_remote("data/http/vin1.json"));
        assert!(!is_remote("http:"));
        assert!(!is_remote(""));
    }
}
