//! `methodCall` document builder.
//!
//! The layout is a fixed template; only the parameter list varies. Text
//! content (method name, strings, member names) is escaped for `<`, `>` and
//! `&` before it is embedded.

use quick_xml::escape::partial_escape;

use crate::value::Value;

/// Serialize a method call into a complete XML-RPC request document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut param_xml = String::new();
    for param in params {
        param_xml.push_str("<param>");
        write_value(&mut param_xml, param);
        param_xml.push_str("</param>");
    }

    format!(
        "<?xml version=\"1.0\"?>\n<methodCall>\n    <methodName>{}</methodName>\n    <params>{param_xml}</params>\n</methodCall>",
        partial_escape(method)
    )
}

/// Serialize a single `<value>` element.
pub fn encode_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Str(s) => {
            out.push_str("<value><string>");
            out.push_str(&partial_escape(s.as_str()));
            out.push_str("</string></value>");
        }
        Value::Int(n) => out.push_str(&format!("<value><int>{n}</int></value>")),
        Value::Double(n) => out.push_str(&format!("<value><double>{n}</double></value>")),
        Value::Array(items) => {
            out.push_str("<value><array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array></value>");
        }
        Value::Struct(members) => {
            out.push_str("<value><struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&partial_escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct></value>");
        }
    }
}
