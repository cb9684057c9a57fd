//! Executing `HttpRequest`s.
//!
//! # Design
//! `Transport` is the only seam where I/O happens, so tests can swap in a
//! scripted implementation and count calls. `UreqTransport` is the real
//! one: a blocking `ureq` agent configured so 4xx/5xx responses come back
//! as data rather than `Err`, because this protocol reports errors inside
//! the body.

use std::time::Duration;

use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};

/// Upper bound on a response body. `read` answers for many records can
/// exceed ureq's 10 MB default.
pub const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        (**self).execute(request)
    }
}

/// Blocking HTTP transport backed by `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Bound the whole round-trip. Expiry surfaces as `Error::Transport`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| Error::Transport(format!("POST {}: {e}", request.url)))?;

        let status = response.status().as_u16();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| Error::Transport(format!("reading body from {}: {e}", request.url)))?;

        Ok(HttpResponse {
            status,
            body: body_text(bytes, &request.url)?,
        })
    }
}

/// A body that arrived intact but is not UTF-8 is a response problem.
fn body_text(bytes: Vec<u8>, url: &str) -> Result<String, Error> {
    String::from_utf8(bytes).map_err(|e| Error::malformed(format!("body from {url} is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_body_is_kept() {
        let body = body_text("<methodResponse/>".as_bytes().to_vec(), "http://erp.local/xmlrpc/db").unwrap();
        assert_eq!(body, "<methodResponse/>");
    }

    #[test]
    fn non_utf8_body_is_malformed() {
        let err = body_text(vec![b'<', 0xff, 0xfe, b'>'], "http://erp.local/xmlrpc/db").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
