//! Error types for the ERP client.
//!
//! # Design
//! Network trouble, protocol trouble and domain outcomes are separate
//! variants so a caller can tell "retry later" from "the server said no"
//! from "you asked for something that does not exist". None of them are
//! retried here.

use erp_xmlrpc::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP round-trip itself failed (refused, timed out, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The body was not XML-RPC, or not the shape the operation expects.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The server answered with an XML-RPC fault.
    #[error("server fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// A protected operation was called before `login`.
    #[error("not authenticated: call login first")]
    NotAuthenticated,

    #[error("authentication failed for {username:?} on database {db:?}")]
    AuthenticationFailed { db: String, username: String },

    #[error("no product with code {0:?}")]
    ProductNotFound(String),

    #[error("order {order_id} has no line with product {product_id}")]
    OrderLineNotFound { order_id: i64, product_id: i64 },
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedResponse(msg.into())
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Fault { code, message } => Error::Fault { code, message },
            DecodeError::Malformed(msg) => Error::MalformedResponse(msg),
        }
    }
}
