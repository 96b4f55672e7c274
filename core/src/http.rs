//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `GithubClient` builds
//! `HttpRequest` values and parses `HttpResponse` values; a `Transport`
//! performs the round-trip in between. Services take the transport as an
//! injected dependency, so tests swap in scripted fakes and production code
//! uses `UreqTransport`.
//!
//! A transport reports every status as data. Only failures that prevent a
//! response from existing at all (DNS, TLS, timeouts, broken bodies) become
//! `NetworkError::Connection`.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::NetworkError;

/// HTTP method for a request. The GitHub endpoints consumed here are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data. The body is raw bytes so the
/// same type carries JSON and avatar images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Executes an `HttpRequest` and returns whatever the server answered.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, NetworkError>> + Send;
}

/// Production transport backed by a `ureq` agent.
///
/// `ureq` is blocking, so each call runs on tokio's blocking pool. The agent
/// is configured to return 4xx/5xx responses as data and to give up after
/// a global timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    fn execute_blocking(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let mut builder = match request.method {
            HttpMethod::Get => agent.get(request.url.as_str()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .call()
            .map_err(|e| NetworkError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| NetworkError::Connection(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let agent = self.agent.clone();
        debug!(method = request.method.as_str(), url = %request.url, "executing request");
        tokio::task::spawn_blocking(move || Self::execute_blocking(&agent, request))
            .await
            .map_err(|e| NetworkError::Connection(e.to_string()))?
    }
}
