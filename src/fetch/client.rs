use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used to download telemetry logs.
///
/// Wrappers such as [`ApiKey`](super::ApiKey) decorate a request before
/// handing it to an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

