//! In-memory ERP speaking XML-RPC, for tests and local experiments.
//!
//! Serves `POST /xmlrpc/db`, `/xmlrpc/common` and `/xmlrpc/object` over a
//! small seeded dataset. Records are kept as ordered `(field, Value)` lists
//! so `read` can hand them back as-is. Like the real server, every answer is
//! HTTP 200 and failures are XML-RPC faults.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use erp_xmlrpc::{decode_value, encode_value, xml, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub type Record = Vec<(String, Value)>;

#[derive(Debug, Clone)]
pub struct User {
    pub db: String,
    pub login: String,
    pub password: String,
    pub uid: i64,
}

/// The whole server state.
#[derive(Debug, Clone, Default)]
pub struct Erp {
    pub databases: Vec<String>,
    pub users: Vec<User>,
    pub models: BTreeMap<String, Vec<Record>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Which model a many-to-one field points at.
fn relation_model(field: &str) -> Option<&'static str> {
    match field {
        "partner_id" => Some("res.partner"),
        "product_id" => Some("product.product"),
        "order_id" => Some("sale.order"),
        _ => None,
    }
}

fn field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    record.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

fn record_id(record: &Record) -> Option<i64> {
    field(record, "id").and_then(Value::as_int)
}

fn relation(id: i64, label: &str) -> Value {
    Value::Array(vec![Value::Int(id), Value::from(label)])
}

impl Erp {
    /// A database `demo` with user `admin`/`admin` (uid 1), a few products
    /// and four sale orders, three of them open.
    pub fn demo() -> Self {
        let mut erp = Erp {
            databases: vec!["demo".to_string(), "staging".to_string()],
            users: vec![User {
                db: "demo".to_string(),
                login: "admin".to_string(),
                password: "admin".to_string(),
                uid: 1,
            }],
            models: BTreeMap::new(),
        };

        for (id, name) in [(9, "Acme Wines"), (10, "Cave du Lac")] {
            erp.insert("res.partner", vec![("id", Value::Int(id)), ("name", Value::from(name))]);
        }
        for (id, name, code) in [
            (21, "Brut Reserve", "BR75"),
            (22, "Rose Brut", "RB75"),
            (23, "Blanc de Blancs", "BB75"),
        ] {
            erp.insert(
                "product.product",
                vec![
                    ("id", Value::Int(id)),
                    ("name", Value::from(name)),
                    ("default_code", Value::from(code)),
                ],
            );
        }
        for (id, name, partner, state) in [
            (1, "SO001", 9, "draft"),
            (2, "SO002", 10, "sent"),
            (3, "SO003", 9, "done"),
            (4, "SO004", 10, "progress"),
        ] {
            let partner = erp.relation("partner_id", partner);
            erp.insert(
                "sale.order",
                vec![
                    ("id", Value::Int(id)),
                    ("name", Value::from(name)),
                    ("partner_id", partner),
                    ("state", Value::from(state)),
                ],
            );
        }
        for (id, order, product, qty) in [(11, 1, 21, 6.0), (12, 1, 22, 12.0), (13, 2, 23, 3.0), (14, 4, 21, 24.0)] {
            let order = erp.relation("order_id", order);
            let product = erp.relation("product_id", product);
            let name = product.as_array().and_then(|p| p[1].as_str()).unwrap_or_default().to_string();
            erp.insert(
                "sale.order.line",
                vec![
                    ("id", Value::Int(id)),
                    ("order_id", order),
                    ("product_id", product),
                    ("name", Value::from(name)),
                    ("product_uom_qty", Value::Double(qty)),
                ],
            );
        }
        erp
    }

    pub fn insert(&mut self, model: &str, record: Vec<(&str, Value)>) {
        let record = record.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self.models.entry(model.to_string()).or_default().push(record);
    }

    pub fn record(&self, model: &str, id: i64) -> Option<&Record> {
        self.models.get(model)?.iter().find(|r| record_id(r) == Some(id))
    }

    /// Label the ERP shows for a record: `[code] name` for products.
    fn display_name(&self, model: &str, id: i64) -> String {
        let Some(record) = self.record(model, id) else {
            return String::new();
        };
        let name = field(record, "name").and_then(Value::as_str).unwrap_or_default();
        match field(record, "default_code").and_then(Value::as_str) {
            Some(code) => format!("[{code}] {name}"),
            None => name.to_string(),
        }
    }

    fn relation(&self, field: &str, id: i64) -> Value {
        let label = relation_model(field)
            .map(|model| self.display_name(model, id))
            .unwrap_or_default();
        relation(id, &label)
    }

    pub fn list(&self) -> Value {
        Value::from(self.databases.clone())
    }

    /// uid on success, `None` when the credentials are refused.
    pub fn login(&self, db: &str, login: &str, password: &str) -> Option<i64> {
        self.users
            .iter()
            .find(|u| u.db == db && u.login == login && u.password == password)
            .map(|u| u.uid)
    }

    pub fn execute(&mut self, params: &[Value]) -> Result<Value, Fault> {
        let [db, uid, password, model, method, args @ ..] = params else {
            return Err(Fault::new(1, "execute needs db, uid, password, model and method"));
        };
        let authorized = self.users.iter().any(|u| {
            Some(u.db.as_str()) == db.as_str()
                && Some(u.uid) == uid.as_int()
                && Some(u.password.as_str()) == password.as_str()
        });
        if !authorized {
            return Err(Fault::new(3, "Access denied"));
        }

        let model = model.as_str().ok_or_else(|| Fault::new(1, "model must be a string"))?;
        if !self.models.contains_key(model) {
            return Err(Fault::new(2, format!("Object {model} doesn't exist")));
        }
        match method.as_str() {
            Some("search") => self.search(model, args),
            Some("read") => self.read(model, args),
            Some("write") => self.write(model, args),
            _ => Err(Fault::new(1, format!("unsupported method {method} on {model}"))),
        }
    }

    /// `search(domain, offset=0, limit=None)`.
    fn search(&self, model: &str, args: &[Value]) -> Result<Value, Fault> {
        let domain = args
            .first()
            .and_then(Value::as_array)
            .ok_or_else(|| Fault::new(1, "search needs a domain"))?;
        let offset = args.get(1).and_then(Value::as_int).unwrap_or(0).max(0) as usize;
        let limit = args.get(2).and_then(Value::as_int).map(|l| l.max(0) as usize);

        let mut ids = Vec::new();
        for record in self.models.get(model).map(Vec::as_slice).unwrap_or_default() {
            if matches_domain(record, domain)? {
                if let Some(id) = record_id(record) {
                    ids.push(Value::Int(id));
                }
            }
        }
        let ids = ids.into_iter().skip(offset).take(limit.unwrap_or(usize::MAX));
        Ok(Value::Array(ids.collect()))
    }

    /// `read(ids, fields)`; missing fields read as `false`.
    fn read(&self, model: &str, args: &[Value]) -> Result<Value, Fault> {
        let ids = args
            .first()
            .and_then(Value::as_array)
            .ok_or_else(|| Fault::new(1, "read needs a list of ids"))?;
        let fields: Vec<&str> = args
            .get(1)
            .and_then(Value::as_array)
            .map(|f| f.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut out = Vec::new();
        for id in ids.iter().filter_map(Value::as_int) {
            let record = self
                .record(model, id)
                .ok_or_else(|| Fault::new(2, format!("Record {model},{id} does not exist")))?;
            let members = if fields.is_empty() {
                record.clone()
            } else {
                let mut members = vec![("id".to_string(), Value::Int(id))];
                for name in fields.iter().filter(|f| **f != "id") {
                    let value = field(record, name).cloned().unwrap_or(Value::Int(0));
                    members.push((name.to_string(), value));
                }
                members
            };
            out.push(Value::Struct(members));
        }
        Ok(Value::Array(out))
    }

    /// `write(ids, values)`; a relation field set to an id gets its label.
    fn write(&mut self, model: &str, args: &[Value]) -> Result<Value, Fault> {
        let ids: Vec<i64> = args
            .first()
            .and_then(Value::as_array)
            .ok_or_else(|| Fault::new(1, "write needs a list of ids"))?
            .iter()
            .filter_map(Value::as_int)
            .collect();
        let values = args
            .get(1)
            .and_then(Value::as_struct)
            .ok_or_else(|| Fault::new(1, "write needs a values struct"))?;

        let mut resolved = Vec::new();
        for (name, value) in values {
            let value = match (relation_model(name), value) {
                (Some(target), Value::Int(id)) => {
                    if self.record(target, *id).is_none() {
                        return Err(Fault::new(2, format!("Record {target},{id} does not exist")));
                    }
                    self.relation(name, *id)
                }
                _ => value.clone(),
            };
            resolved.push((name.clone(), value));
        }

        let records = self.models.get_mut(model).map(Vec::as_mut_slice).unwrap_or_default();
        for id in ids {
            let record = records
                .iter_mut()
                .find(|r| record_id(r) == Some(id))
                .ok_or_else(|| Fault::new(2, format!("Record {model},{id} does not exist")))?;
            for (name, value) in &resolved {
                match record.iter_mut().find(|(k, _)| k == name) {
                    Some((_, slot)) => *slot = value.clone(),
                    None => record.push((name.clone(), value.clone())),
                }
            }
        }
        Ok(Value::Int(1))
    }
}

/// All `[field, op, value]` terms must hold. Relations compare by id.
fn matches_domain(record: &Record, domain: &[Value]) -> Result<bool, Fault> {
    for term in domain {
        let [name, op, expected] = term.as_array().unwrap_or_default() else {
            return Err(Fault::new(1, format!("unsupported domain term {term}")));
        };
        let name = name.as_str().unwrap_or_default();
        let actual = match field(record, name) {
            Some(Value::Array(pair)) if pair.len() == 2 => pair[0].clone(),
            Some(value) => value.clone(),
            None => Value::Int(0),
        };
        let hit = match op.as_str() {
            Some("=") => actual == *expected,
            Some("!=") => actual != *expected,
            Some("in") => expected.as_array().is_some_and(|set| set.contains(&actual)),
            _ => return Err(Fault::new(1, format!("unsupported operator {op}"))),
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

pub type Db = Arc<RwLock<Erp>>;

/// Parse a `methodCall` document into its method name and parameters.
pub fn parse_call(body: &str) -> Result<(String, Vec<Value>), Fault> {
    let root = xml::parse(body).map_err(|e| Fault::new(1, e.to_string()))?;
    if root.name != "methodCall" {
        return Err(Fault::new(1, format!("expected <methodCall>, found <{}>", root.name)));
    }
    let method = root
        .child("methodName")
        .map(|m| m.text.trim().to_string())
        .ok_or_else(|| Fault::new(1, "missing <methodName>"))?;
    let mut params = Vec::new();
    if let Some(list) = root.child("params") {
        for param in list.children_named("param") {
            let value = param
                .child("value")
                .ok_or_else(|| Fault::new(1, "<param> without <value>"))?;
            params.push(decode_value(value).map_err(|e| Fault::new(1, e.to_string()))?);
        }
    }
    Ok((method, params))
}

pub fn response_xml(value: &Value) -> String {
    format!(
        "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n{}\n</param>\n</params>\n</methodResponse>\n",
        encode_value(value)
    )
}

pub fn fault_xml(fault: &Fault) -> String {
    let detail = Value::structure([
        ("faultCode", Value::Int(fault.code)),
        ("faultString", Value::from(fault.message.as_str())),
    ]);
    format!(
        "<?xml version='1.0'?>\n<methodResponse>\n<fault>\n{}\n</fault>\n</methodResponse>\n",
        encode_value(&detail)
    )
}

/// A refused login answers `False`, which XML-RPC spells as a boolean.
const LOGIN_REFUSED: &str = "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n\
                             <value><boolean>0</boolean></value>\n</param>\n</params>\n</methodResponse>\n";

fn xml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

fn reply(result: Result<Value, Fault>) -> Response {
    match result {
        Ok(value) => xml_response(response_xml(&value)),
        Err(fault) => {
            tracing::debug!(code = fault.code, message = %fault.message, "fault");
            xml_response(fault_xml(&fault))
        }
    }
}

pub fn app() -> Router {
    app_with(Erp::demo())
}

pub fn app_with(erp: Erp) -> Router {
    let db: Db = Arc::new(RwLock::new(erp));
    Router::new()
        .route("/xmlrpc/db", post(db_service))
        .route("/xmlrpc/common", post(common_service))
        .route("/xmlrpc/object", post(object_service))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn db_service(State(db): State<Db>, body: String) -> Response {
    let (method, _) = match parse_call(&body) {
        Ok(call) => call,
        Err(fault) => return reply(Err(fault)),
    };
    match method.as_str() {
        "list" => reply(Ok(db.read().await.list())),
        other => reply(Err(Fault::new(1, format!("unknown method {other:?} on db")))),
    }
}

async fn common_service(State(db): State<Db>, body: String) -> Response {
    let (method, params) = match parse_call(&body) {
        Ok(call) => call,
        Err(fault) => return reply(Err(fault)),
    };
    if method != "login" {
        return reply(Err(Fault::new(1, format!("unknown method {method:?} on common"))));
    }
    let [db_name, login, password] = params.as_slice() else {
        return reply(Err(Fault::new(1, "login takes db, login and password")));
    };
    let uid = db.read().await.login(
        db_name.as_str().unwrap_or_default(),
        login.as_str().unwrap_or_default(),
        password.as_str().unwrap_or_default(),
    );
    tracing::debug!(login = ?login.as_str(), ok = uid.is_some(), "login");
    match uid {
        Some(uid) => reply(Ok(Value::Int(uid))),
        None => xml_response(LOGIN_REFUSED.to_string()),
    }
}

async fn object_service(State(db): State<Db>, body: String) -> Response {
    let (method, params) = match parse_call(&body) {
        Ok(call) => call,
        Err(fault) => return reply(Err(fault)),
    };
    if method != "execute" {
        return reply(Err(Fault::new(1, format!("unknown method {method:?} on object"))));
    }
    let result = db.write().await.execute(&params);
    reply(result)
}
