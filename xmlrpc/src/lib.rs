//! XML-RPC codec for the ERP's `db`, `common` and `object` endpoints.
//!
//! # Overview
//! Turns a method name plus [`Value`] parameters into a `methodCall`
//! document, and a `methodResponse` document back into a [`Value`] or a
//! fault. No I/O happens here; the caller moves the bytes.
//!
//! # Design
//! - Only string, int, double, array and struct are modelled.
//! - Numeric parameters built from Rust integers always encode as `<int>`;
//!   the decoder keeps `<int>` and `<double>` apart.
//! - String content is escaped on the way out, so user input containing
//!   `<` or `&` cannot break the request document.

pub mod decode;
pub mod encode;
pub mod error;
pub mod value;
pub mod xml;

pub use decode::{decode_response, decode_value};
pub use encode::{encode_call, encode_value};
pub use error::DecodeError;
pub use value::Value;
pub use xml::Element;
