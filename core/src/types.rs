//! Domain records and their projection from decoded XML-RPC structs.
//!
//! # Design
//! `read` answers with one struct per record. Each member is first
//! projected into a [`Field`] by looking only at its shape, then the typed
//! record picks the fields it needs. A member whose shape does not fit its
//! field is `None` (the ERP sends `false` for unset values); only the record
//! id is required, and a record that is not a struct is malformed.

use std::fmt;

use erp_xmlrpc::Value;
use serde::Serialize;

use crate::error::Error;

/// A many-to-one reference: the target id plus its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleOrder {
    pub id: i64,
    pub name: Option<String>,
    pub partner: Option<Relation>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub product: Option<Relation>,
    pub quantity: Option<f64>,
}

/// What `login` needs.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub db: String,
    pub username: String,
    pub password: String,
}

/// An authenticated session.
///
/// The protocol has no session tokens: every `execute` call resends
/// `(db, uid, password)`, so `id` holds the password supplied at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub db: String,
    pub uid: i64,
    pub username: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &"<redacted>")
            .field("db", &self.db)
            .field("uid", &self.uid)
            .field("username", &self.username)
            .finish()
    }
}

/// The shape of one struct member.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i64),
    Float(f64),
    Text(String),
    Relation(Relation),
    Null,
}

impl Field {
    pub fn project(value: &Value) -> Field {
        match value {
            Value::Int(n) => Field::Int(*n),
            Value::Double(n) => Field::Float(*n),
            Value::Str(s) => Field::Text(s.clone()),
            Value::Array(items) => match items.as_slice() {
                [Value::Int(id), Value::Str(label)] => Field::Relation(Relation {
                    id: *id,
                    label: label.clone(),
                }),
                _ => Field::Null,
            },
            Value::Struct(_) => Field::Null,
        }
    }
}

/// Named access to the members of one record struct.
pub(crate) struct Record<'a> {
    value: &'a Value,
}

impl<'a> Record<'a> {
    pub(crate) fn new(value: &'a Value) -> Result<Self, Error> {
        match value {
            Value::Struct(_) => Ok(Self { value }),
            other => Err(Error::malformed(format!(
                "expected a record struct, got {}",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Field {
        self.value.get(name).map(Field::project).unwrap_or(Field::Null)
    }

    pub(crate) fn int(&self, name: &str) -> Result<i64, Error> {
        match self.field(name) {
            Field::Int(n) => Ok(n),
            other => Err(Error::malformed(format!("field {name:?}: expected int, got {other:?}"))),
        }
    }

    pub(crate) fn text(&self, name: &str) -> Option<String> {
        match self.field(name) {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text, or empty when the ERP sent `false`.
    pub(crate) fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    pub(crate) fn relation(&self, name: &str) -> Option<Relation> {
        match self.field(name) {
            Field::Relation(r) => Some(r),
            _ => None,
        }
    }

    /// Quantities may arrive as `<double>` or `<int>`; the double wins.
    pub(crate) fn number(&self, name: &str) -> Option<f64> {
        match self.field(name) {
            Field::Float(n) => Some(n),
            Field::Int(n) => Some(n as f64),
            _ => None,
        }
    }
}

impl SaleOrder {
    pub const FIELDS: [&'static str; 4] = ["id", "name", "partner_id", "state"];

    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let record = Record::new(value)?;
        Ok(Self {
            id: record.int("id")?,
            name: record.text("name"),
            partner: record.relation("partner_id"),
            state: record.text("state"),
        })
    }
}

impl OrderLine {
    pub const FIELDS: [&'static str; 2] = ["product_id", "product_uom_qty"];

    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let record = Record::new(value)?;
        Ok(Self {
            product: record.relation("product_id"),
            quantity: record.number("product_uom_qty"),
        })
    }
}
