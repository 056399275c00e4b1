use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// Telemetry exports behind a fleet portal usually expect a bearer token;
/// other providers name their own header.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Uses a custom header, e.g. `x-api-key: <key>`.
    pub fn header(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut value = HeaderValue::from_str(key)?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        Self::header(inner, AUTHORIZATION.as_str(), &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use std::sync::Mutex;

    /// Records outgoing headers, then forwards to a real client.
    struct Recorder {
        inner: BasicClient,
        seen: Mutex<Option<reqwest::header::HeaderMap>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                inner: BasicClient::new(),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpClient for Recorder {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.seen.lock().unwrap() = Some(req.headers().clone());
            self.inner.execute(req).await
        }
    }

    #[tokio::test]
    async fn test_bearer_header_injected() {
        let client = ApiKey::bearer(Recorder::new(), "secret").unwrap();

        // Nothing listens on the discard port; only the outgoing request matters.
        let _ = crate::fetch::fetch_bytes(&client, "http://127.0.0.1:9/log.json").await;

        let headers = client.inner.seen.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret");
    }

    #[tokio::test]
    async fn test_custom_header_injected() {
        let client = ApiKey::header(Recorder::new(), "x-api-key", "k-123").unwrap();
        let _ = crate::fetch::fetch_bytes(&client, "http://127.0.0.1:9/log.json").await;

        let headers = client.inner.seen.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "k-123");
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        assert!(ApiKey::header(Recorder::new(), "bad header", "k").is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        assert!(crate::fetch::fetch_bytes(&BasicClient::new(), "not a url").await.is_err());
    }
}
