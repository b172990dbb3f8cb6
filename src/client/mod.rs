mod builder;
mod retry;

use crate::error::FetchError;
use async_trait::async_trait;
pub use builder::ClientBuilder;
pub use retry::{RetryPolicy, RetryingFetcher};
use rquest::Client as RquestClient;
use std::time::Duration;
use tracing::debug;

/// Anything that can turn a URL into the raw body of whatever the server sent.
///
/// Implementations return the body for every HTTP status; interpreting an
/// application-level error page is up to the caller.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for std::sync::Arc<F> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

pub struct Client {
    inner: RquestClient,
    request_timeout: Duration,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    async fn request(&self, url: &str) -> Result<String, FetchError> {
        let response = self.inner.get(url).send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content = response.text().await.map_err(classify)?;
        debug!(url, status, bytes = content.len(), "[client] response received");

        Ok(content)
    }
}

#[async_trait]
impl Fetch for Client {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match tokio::time::timeout(self.request_timeout, self.request(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Transient(format!(
                "request to {} timed out after {:?}",
                url, self.request_timeout
            ))),
        }
    }
}

/// Connection-level trouble is worth retrying; anything else is not going to
/// get better by asking again.
fn classify(err: rquest::Error) -> FetchError {
    if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        FetchError::Transient(err.to_string())
    } else {
        FetchError::Permanent(err.to_string())
    }
}
