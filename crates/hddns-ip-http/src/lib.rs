// # HTTP IP Source
//
// This crate provides the public IP lookup used by both hddns modes.
//
// ## Architecture
//
// Fetches the caller's public IP from an external echo service
// (default: checkip.amazonaws.com) with one plain GET per lookup.
//
// - ✅ Exactly one request per `current()` call
// - ✅ Body returned verbatim, minus one trailing newline
// - ❌ NO IP address validation (the service is trusted)
// - ❌ NO caching, NO retries (the engine owns the single retry)

use hddns_core::config::DEFAULT_IP_SERVICE_URL;
use hddns_core::traits::IpSource;
use hddns_core::{Error, Result};
use std::time::Duration;

/// Default HTTP timeout for IP lookups (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: echo service returning the caller's IP as plain text
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source against [`DEFAULT_IP_SERVICE_URL`]
    pub fn with_default_service() -> Result<Self> {
        Self::new(DEFAULT_IP_SERVICE_URL)
    }

    /// URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("HTTP error from {}: {}", self.url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = strip_newline(&body);
        if ip.is_empty() {
            return Err(Error::network(format!("Empty response from {}", self.url)));
        }

        tracing::debug!("Public IP reported by {}: {}", self.url, ip);
        Ok(ip.to_string())
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Remove a single trailing newline, leaving everything else untouched
fn strip_newline(body: &str) -> &str {
    body.strip_suffix('\n').unwrap_or(body)
}
