//! Blocking executor for `HttpRequest` values.
//!
//! # Design
//! `Transport` is the only place where I/O happens. `UreqTransport` keeps a
//! single `ureq::Agent` for the lifetime of the client so connections are
//! reused between calls. The agent is configured not to treat 4xx/5xx as
//! errors: status interpretation belongs to the caller.

use std::fmt;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// `Transport` backed by a persistent `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: agent(None),
        }
    }

    /// Route every request through the given HTTP proxy, if any.
    pub fn with_proxy(proxy: Option<&str>) -> Result<Self, ApiError> {
        let proxy = proxy
            .map(|uri| ureq::Proxy::new(uri).map_err(|_| ApiError::InvalidProxy(uri.to_string())))
            .transpose()?;
        Ok(Self {
            agent: agent(proxy),
        })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Without an explicit proxy the agent keeps ureq's default, which honors
/// `HTTP_PROXY` / `HTTPS_PROXY` / `ALL_PROXY` from the environment.
fn agent(proxy: Option<ureq::Proxy>) -> ureq::Agent {
    let mut builder = ureq::Agent::config_builder().http_status_as_error(false);
    if let Some(proxy) = proxy {
        builder = builder.proxy(Some(proxy));
    }
    builder.build().new_agent()
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let mut response = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes())?,
                    None => builder.send_empty()?,
                }
            }
        };

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
        let body = response.body_mut().read_to_string()?;

        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
