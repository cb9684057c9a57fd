//! HTTP requests and responses as plain data.
//!
//! # Design
//! The client builds an `HttpRequest`, hands it to a [`Transport`], and
//! parses whatever `HttpResponse` comes back. Every call is a POST of an
//! XML document, so the request carries no method field.
//!
//! [`Transport`]: crate::transport::Transport

/// One of the three fixed XML-RPC services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Db,
    Common,
    Object,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Db => "/xmlrpc/db",
            Endpoint::Common => "/xmlrpc/common",
            Endpoint::Object => "/xmlrpc/object",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Db => "db",
            Endpoint::Common => "common",
            Endpoint::Object => "object",
        }
    }
}

/// An XML-RPC POST described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Status and body of whatever the server answered. The status is kept for
/// logging only; faults travel in the body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}
