use super::Client;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use http::{
    header::{HeaderMap, HeaderName},
    HeaderValue,
};
use rquest::{Client as RquestClient, Impersonate, Proxy};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct ClientBuilder {
    proxy: Option<String>,
    chrome_impersonation: bool,
    request_timeout: Option<Duration>,
    headers: HeaderMap,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            ..Default::default()
        }
    }

    /// Applies user agent, proxy, impersonation and timeout from the
    /// `[client]` configuration section.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = Self::new()
            .header("user-agent", &config.user_agent)?
            .header("accept-language", "en-US,en;q=0.7")?
            .chrome_impersonation(config.impersonate)
            .request_timeout(Duration::from_secs(config.request_timeout));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(proxy);
        }
        Ok(builder)
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn chrome_impersonation(mut self, enabled: bool) -> Self {
        self.chrome_impersonation = enabled;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn header<K, V>(mut self, key: K, value: V) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let header_name = HeaderName::from_str(key.as_ref())
            .map_err(|e| ClientError::BuildError(format!("Invalid header name: {}", e)))?;

        let header_value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| ClientError::BuildError(format!("Invalid header value: {}", e)))?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn build(self) -> Result<Client> {
        let mut client_builder = RquestClient::builder();

        if let Some(proxy_url) = self.proxy {
            Url::parse(&proxy_url)
                .map_err(|e| ClientError::InvalidUrl(format!("Invalid proxy URL: {}", e)))?;
            client_builder = client_builder.proxy(Proxy::all(&proxy_url).map_err(|e| {
                ClientError::BuildError(format!("Failed to configure proxy: {}", e))
            })?);
        }

        if self.chrome_impersonation {
            client_builder = client_builder.impersonate(Impersonate::Chrome131);
        }

        let mut inner = client_builder
            .build()
            .map_err(|e| ClientError::BuildError(format!("Failed to build client: {}", e)))?;

        *inner.as_mut().headers() = self.headers;

        Ok(Client {
            inner,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}
