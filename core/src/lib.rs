//! Blocking client for the ERP's XML-RPC services.
//!
//! # Overview
//! Authenticates against `/xmlrpc/common`, lists databases on
//! `/xmlrpc/db`, and reads or writes sale orders through `execute` on
//! `/xmlrpc/object`. Encoding and decoding live in `erp-xmlrpc`; this crate
//! adds the HTTP round-trip, the session and the typed operations.
//!
//! # Design
//! - `ErpClient` is generic over [`Transport`], so tests run without a
//!   network and hosts can bring their own HTTP stack.
//! - The protocol has no session token: the password given to `login` is
//!   resent with every `execute` call.
//! - Errors are never retried or compensated here; a multi-step operation
//!   that fails part-way simply stops.

pub mod client;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{ErpClient, OPEN_ORDER_STATES};
pub use erp_xmlrpc::Value;
pub use error::Error;
pub use http::{Endpoint, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{Credentials, Field, OrderLine, Relation, SaleOrder, Session};
