//! Blocking HTTP transport backed by `reqwest`.

use super::{Response, SourceError, Transport};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Transport`] that performs real HTTP requests.
///
/// Each request is bounded by the client timeout; failures are not retried.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport with a 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Transport` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response, SourceError> {
        let mut request = self.client.get(url);
        for &(name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .map_err(|e| SourceError::Transport(format!("{}: {}", url, e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| SourceError::MalformedResponse(format!("{}: {}", url, e)))?;

        tracing::debug!("GET {} -> {}", url, status);
        Ok(Response { status, body })
    }
}
