//! Executing `HttpRequest` values against the network.
//!
//! # Design
//! [`Transport`] is the single I/O seam of the crate. The builders and
//! parsers never see it; only [`crate::PortalClient`] does. Tests substitute
//! a scripted implementation to count and inspect outgoing requests.
//!
//! [`UreqTransport`] is the blocking default. Status codes are returned as
//! data (`http_status_as_error(false)`) so the parsers decide what counts as
//! failure, not the HTTP library.

use std::time::Duration;

use thiserror::Error;
use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Largest response body `UreqTransport` reads by default. ureq's own
/// default is 10 MB, which large people or file listings can exceed.
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// The request produced no HTTP response at all.
#[derive(Debug, Clone, Error)]
#[error("{description}")]
pub struct TransportError {
    description: String,
}

impl TransportError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

/// Performs one blocking HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Holds two agents so a single transport can serve sessions with and
/// without certificate verification; `HttpRequest::verify_tls` picks one.
/// Bodies longer than the body limit fail as a `TransportError`.
#[derive(Clone)]
pub struct UreqTransport {
    verifying: Agent,
    insecure: Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Apply a global per-request timeout. Without one, ureq's defaults apply.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = |verify: bool| {
            Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .tls_config(TlsConfig::builder().disable_verification(!verify).build())
                .build()
                .new_agent()
        };
        Self {
            verifying: agent(true),
            insecure: agent(false),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }

    fn agent(&self, verify_tls: bool) -> &Agent {
        if verify_tls {
            &self.verifying
        } else {
            &self.insecure
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent(request.verify_tls);

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
