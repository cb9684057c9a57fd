//! Session-holding XML-RPC client for the ERP.
//!
//! # Design
//! `ErpClient` owns a base URL, a [`Transport`] and the current
//! [`Session`]. Every operation is `build_call` → transport → `parse_response`,
//! and the first two are usable on their own for callers that want to run
//! the I/O themselves.
//!
//! `login` is the only method taking `&mut self`, so a session cannot be
//! swapped while another operation on the same client is in flight. All
//! multi-call operations run their calls strictly in sequence and do not
//! compensate for a failure halfway through.

use erp_xmlrpc::{decode_response, encode_call, Value};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::http::{Endpoint, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Credentials, OrderLine, Record, SaleOrder, Session};

/// States considered open when listing sale orders.
pub const OPEN_ORDER_STATES: [&str; 3] = ["draft", "sent", "progress"];

pub struct ErpClient<T> {
    base_url: String,
    transport: T,
    session: Option<Session>,
}

impl<T: Transport> ErpClient<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session: None,
        }
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// The current session, or `NotAuthenticated` before the first login.
    pub fn session(&self) -> Result<&Session, Error> {
        self.session.as_ref().ok_or(Error::NotAuthenticated)
    }

    pub fn build_call(&self, endpoint: Endpoint, method: &str, params: &[Value]) -> HttpRequest {
        HttpRequest {
            url: self.endpoint_url(endpoint),
            headers: vec![
                ("Content-Type".to_string(), "text/xml".to_string()),
                ("Accept".to_string(), "text/xml".to_string()),
            ],
            body: encode_call(method, params),
        }
    }

    /// Decode the body whatever the HTTP status was.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, Error> {
        if response.status >= 400 {
            debug!(status = response.status, "non-success status, decoding body anyway");
        }
        Ok(decode_response(&response.body)?)
    }

    /// One XML-RPC round-trip.
    pub fn call(&self, endpoint: Endpoint, method: &str, params: &[Value]) -> Result<Value, Error> {
        debug!(endpoint = endpoint.name(), method, params = params.len(), "xml-rpc call");
        let response = self.transport.execute(self.build_call(endpoint, method, params))?;
        let result = self.parse_response(response);
        if let Err(Error::Fault { code, message }) = &result {
            warn!(endpoint = endpoint.name(), method, code, %message, "server fault");
        }
        result
    }

    /// `execute(db, uid, password, model, method, args...)` on the object endpoint.
    pub fn execute(&self, model: &str, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        let session = self.session()?;
        let mut params = vec![
            Value::from(&session.db),
            Value::Int(session.uid),
            Value::from(&session.id),
            Value::from(model),
            Value::from(method),
        ];
        params.extend(args);
        self.call(Endpoint::Object, "execute", &params)
    }

    /// Ids of `model` records matching `domain`, optionally capped at `limit`.
    pub fn search(&self, model: &str, domain: Value, limit: Option<i64>) -> Result<Vec<i64>, Error> {
        let mut args = vec![domain];
        if let Some(limit) = limit {
            // search(domain, offset, limit)
            args.push(Value::Int(0));
            args.push(Value::Int(limit));
        }
        let result = self.execute(model, "search", args)?;
        ids_from(&result)
    }

    /// One struct per id, holding the requested fields.
    pub fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Vec<Value>, Error> {
        let args = vec![Value::from(ids), Value::from(fields)];
        match self.execute(model, "read", args)? {
            Value::Array(records) => Ok(records),
            other => Err(Error::malformed(format!(
                "read on {model} returned {}, expected array",
                other.type_name()
            ))),
        }
    }

    /// Names of the databases the server hosts.
    pub fn list_databases(&self) -> Result<Vec<String>, Error> {
        match self.call(Endpoint::Db, "list", &[])? {
            Value::Str(name) => Ok(vec![name]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Str(name) => Ok(name),
                    other => Err(Error::malformed(format!(
                        "database name is {}, expected string",
                        other.type_name()
                    ))),
                })
                .collect(),
            other => Err(Error::malformed(format!(
                "db list returned {}, expected array",
                other.type_name()
            ))),
        }
    }

    /// Authenticate and replace the current session.
    ///
    /// A failed login leaves any previous session in place.
    pub fn login(&mut self, credentials: &Credentials) -> Result<&Session, Error> {
        let params = [
            Value::from(&credentials.db),
            Value::from(&credentials.username),
            Value::from(&credentials.password),
        ];
        // An untyped `<value>7</value>` decodes as a string.
        let uid = match self.call(Endpoint::Common, "login", &params)? {
            Value::Int(uid) => Some(uid),
            Value::Str(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        let uid = match uid {
            Some(uid) if uid != 0 => uid,
            _ => {
                return Err(Error::AuthenticationFailed {
                    db: credentials.db.clone(),
                    username: credentials.username.clone(),
                })
            }
        };

        info!(db = %credentials.db, username = %credentials.username, uid, "logged in");
        let session = self.session.insert(Session {
            id: credentials.password.clone(),
            db: credentials.db.clone(),
            uid,
            username: credentials.username.clone(),
        });
        Ok(session)
    }

    /// Sale orders in one of [`OPEN_ORDER_STATES`].
    pub fn get_open_sale_orders(&self) -> Result<Vec<SaleOrder>, Error> {
        let domain = Value::Array(vec![Value::Array(vec![
            Value::from("state"),
            Value::from("in"),
            Value::from(OPEN_ORDER_STATES.as_slice()),
        ])]);
        let ids = self.search("sale.order", domain, None)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.read("sale.order", &ids, &SaleOrder::FIELDS)?
            .iter()
            .map(SaleOrder::from_value)
            .collect()
    }

    pub fn get_sale_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, Error> {
        let domain = Value::Array(vec![condition("order_id", "=", Value::Int(order_id))]);
        let ids = self.search("sale.order.line", domain, None)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.read("sale.order.line", &ids, &OrderLine::FIELDS)?
            .iter()
            .map(OrderLine::from_value)
            .collect()
    }

    /// Id of the product whose internal reference is `code`.
    pub fn find_product_by_code(&self, code: &str) -> Result<i64, Error> {
        let domain = Value::Array(vec![condition("default_code", "=", Value::from(code))]);
        let ids = self.search("product.product", domain, None)?;
        ids.first()
            .copied()
            .ok_or_else(|| Error::ProductNotFound(code.to_string()))
    }

    /// `"[{default_code}] {name}"`, the label order lines carry.
    pub fn product_display_name(&self, product_id: i64) -> Result<String, Error> {
        let records = self.read("product.product", &[product_id], &["name", "default_code"])?;
        let first = records
            .first()
            .ok_or_else(|| Error::malformed(format!("product {product_id} could not be read")))?;
        let record = Record::new(first)?;
        Ok(format!(
            "[{}] {}",
            record.text_or_empty("default_code"),
            record.text_or_empty("name")
        ))
    }

    /// The first line of `order_id` that carries `product_id`.
    pub fn find_order_line(&self, order_id: i64, product_id: i64) -> Result<i64, Error> {
        let domain = Value::Array(vec![
            condition("order_id", "=", Value::Int(order_id)),
            condition("product_id", "=", Value::Int(product_id)),
        ]);
        let ids = self.search("sale.order.line", domain, Some(1))?;
        ids.first()
            .copied()
            .ok_or(Error::OrderLineNotFound { order_id, product_id })
    }

    /// Set product and description of one line in a single write.
    pub fn write_order_line_product(&self, line_id: i64, product_id: i64, name: &str) -> Result<(), Error> {
        let values = Value::structure([("product_id", Value::Int(product_id)), ("name", Value::from(name))]);
        self.execute("sale.order.line", "write", vec![Value::from(vec![line_id]), values])?;
        Ok(())
    }

    /// Swap the product on the line of `order_id` that currently carries
    /// `old_product_id` for the product with reference `new_product_code`.
    pub fn update_order_line_product(
        &self,
        order_id: i64,
        old_product_id: i64,
        new_product_code: &str,
    ) -> Result<(), Error> {
        let product_id = self.find_product_by_code(new_product_code)?;
        let name = self.product_display_name(product_id)?;
        let line_id = self.find_order_line(order_id, old_product_id)?;
        self.write_order_line_product(line_id, product_id, &name)?;
        info!(order_id, line_id, product_id, %name, "order line product updated");
        Ok(())
    }
}

fn condition(field: &str, op: &str, value: Value) -> Value {
    Value::Array(vec![Value::from(field), Value::from(op), value])
}

fn ids_from(result: &Value) -> Result<Vec<i64>, Error> {
    let items = result
        .as_array()
        .ok_or_else(|| Error::malformed(format!("search returned {}, expected array", result.type_name())))?;
    items
        .iter()
        .map(|item| {
            item.as_int()
                .ok_or_else(|| Error::malformed(format!("search id is {}, expected int", item.type_name())))
        })
        .collect()
}
