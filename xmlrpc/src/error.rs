//! Decoding failures.
//!
//! # Design
//! A server-reported fault and a document we cannot make sense of are kept
//! apart: the first is an application answer worth showing to a user, the
//! second means the peer is not speaking the protocol we expect.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The response carried a `<fault>` envelope.
    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The document is not XML, or not shaped like an XML-RPC response.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl DecodeError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        DecodeError::Malformed(msg.into())
    }
}
