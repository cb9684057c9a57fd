//! `methodResponse` decoding.
//!
//! # Design
//! The response is first parsed into a generic [`Element`] tree, then the
//! envelope is checked one level at a time. Every `<value>` node goes
//! through [`decode_value`], one match arm per type tag, so an unexpected
//! shape is reported instead of silently turning into a default.

use crate::error::DecodeError;
use crate::value::Value;
use crate::xml::{self, Element};

/// Decode a complete response document into its single return value.
///
/// A `<fault>` envelope becomes `DecodeError::Fault`.
pub fn decode_response(doc: &str) -> Result<Value, DecodeError> {
    let root = xml::parse(doc)?;
    if root.name != "methodResponse" {
        return Err(DecodeError::malformed(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    let body = root
        .first_child()
        .ok_or_else(|| DecodeError::malformed("empty <methodResponse>"))?;
    match body.name.as_str() {
        "fault" => Err(decode_fault(body)),
        "params" => {
            let value = body
                .child("param")
                .and_then(|param| param.child("value"))
                .ok_or_else(|| DecodeError::malformed("missing params/param/value"))?;
            decode_value(value)
        }
        other => Err(DecodeError::malformed(format!(
            "expected <params> or <fault>, found <{other}>"
        ))),
    }
}

fn decode_fault(fault: &Element) -> DecodeError {
    let value = match fault.child("value") {
        Some(value) => value,
        None => return DecodeError::malformed("missing fault/value"),
    };
    let detail = match decode_value(value) {
        Ok(detail) => detail,
        Err(e) => return e,
    };
    let message = match detail.get("faultString") {
        Some(Value::Str(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => return DecodeError::malformed("fault without faultString"),
    };
    // Some servers send the code as a string; anything unparseable is 0.
    let code = match detail.get("faultCode") {
        Some(Value::Int(code)) => *code,
        Some(Value::Str(code)) => code.trim().parse().unwrap_or(0),
        _ => 0,
    };
    DecodeError::Fault { code, message }
}

/// Interpret a `<value>` element.
pub fn decode_value(value: &Element) -> Result<Value, DecodeError> {
    if value.name != "value" {
        return Err(DecodeError::malformed(format!(
            "expected <value>, found <{}>",
            value.name
        )));
    }

    // An untyped value is a string.
    let typed = match value.first_child() {
        Some(typed) => typed,
        None => return Ok(Value::Str(value.text.clone())),
    };

    match typed.name.as_str() {
        "string" => Ok(Value::Str(typed.text.clone())),
        "int" | "i4" | "i8" => parse_int(&typed.text).map(Value::Int),
        "boolean" => match typed.text.trim() {
            "0" => Ok(Value::Int(0)),
            "1" => Ok(Value::Int(1)),
            other => Err(DecodeError::malformed(format!("invalid boolean {other:?}"))),
        },
        "double" => typed
            .text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| DecodeError::malformed(format!("invalid double {:?}", typed.text))),
        "array" => {
            let items = match typed.child("data") {
                Some(data) => data
                    .children_named("value")
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(items))
        }
        "struct" => typed
            .children_named("member")
            .map(decode_member)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Struct),
        "dateTime.iso8601" | "base64" | "nil" => Ok(Value::Str(typed.text.clone())),
        other => Err(DecodeError::malformed(format!("unknown type tag <{other}>"))),
    }
}

fn decode_member(member: &Element) -> Result<(String, Value), DecodeError> {
    let name = member
        .child("name")
        .ok_or_else(|| DecodeError::malformed("struct member without <name>"))?;
    let value = member
        .child("value")
        .ok_or_else(|| DecodeError::malformed(format!("struct member {:?} without <value>", name.text)))?;
    Ok((name.text.clone(), decode_value(value)?))
}

fn parse_int(text: &str) -> Result<i64, DecodeError> {
    text.trim()
        .parse()
        .map_err(|_| DecodeError::malformed(format!("invalid int {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: &str) -> String {
        format!(
            "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n{value}\n</param>\n</params>\n</methodResponse>\n"
        )
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(
            decode_response(&response("<value><string>db1</string></value>")).unwrap(),
            Value::Str("db1".to_string())
        );
        assert_eq!(
            decode_response(&response("<value><int>7</int></value>")).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            decode_response(&response("<value><i4>-3</i4></value>")).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(
            decode_response(&response("<value><double>2.5</double></value>")).unwrap(),
            Value::Double(2.5)
        );
    }

    #[test]
    fn untyped_value_is_string() {
        assert_eq!(
            decode_response(&response("<value>db1</value>")).unwrap(),
            Value::Str("db1".to_string())
        );
        assert_eq!(
            decode_response(&response("<value></value>")).unwrap(),
            Value::Str(String::new())
        );
    }

    #[test]
    fn empty_array_is_not_an_error() {
        let empty = Value::Array(Vec::new());
        assert_eq!(
            decode_response(&response("<value><array><data/></array></value>")).unwrap(),
            empty
        );
        assert_eq!(
            decode_response(&response("<value><array></array></value>")).unwrap(),
            empty
        );
    }

    #[test]
    fn decodes_struct_with_relation() {
        let xml = response(
            "<value><struct>\
             <member><name>id</name><value><int>3</int></value></member>\
             <member><name>partner_id</name><value><array><data>\
             <value><int>9</int></value><value><string>Acme</string></value>\
             </data></array></value></member>\
             </struct></value>",
        );
        let v = decode_response(&xml).unwrap();
        assert_eq!(v.get("id"), Some(&Value::Int(3)));
        assert_eq!(
            v.get("partner_id"),
            Some(&Value::Array(vec![Value::Int(9), Value::Str("Acme".to_string())]))
        );
    }

    #[test]
    fn boolean_decodes_as_int() {
        assert_eq!(
            decode_response(&response("<value><boolean>0</boolean></value>")).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn raw_text_types_decode_as_string() {
        assert_eq!(
            decode_response(&response("<value><dateTime.iso8601>20240102T03:04:05</dateTime.iso8601></value>")).unwrap(),
            Value::Str("20240102T03:04:05".to_string())
        );
        assert_eq!(
            decode_response(&response("<value><nil/></value>")).unwrap(),
            Value::Str(String::new())
        );
    }

    #[test]
    fn fault_carries_code_and_message() {
        let xml = "<methodResponse><fault><value><struct>\
                   <member><name>faultCode</name><value><int>4</int></value></member>\
                   <member><name>faultString</name><value><string>Too many params</string></value></member>\
                   </struct></value></fault></methodResponse>";
        assert_eq!(
            decode_response(xml).unwrap_err(),
            DecodeError::Fault {
                code: 4,
                message: "Too many params".to_string()
            }
        );
    }

    #[test]
    fn fault_without_code_defaults_to_zero() {
        let xml = "<methodResponse><fault><value><struct>\
                   <member><name>faultString</name><value><string>boom</string></value></member>\
                   </struct></value></fault></methodResponse>";
        assert_eq!(
            decode_response(xml).unwrap_err(),
            DecodeError::Fault {
                code: 0,
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn fault_without_message_is_malformed() {
        let xml = "<methodResponse><fault><value><struct></struct></value></fault></methodResponse>";
        assert!(matches!(decode_response(xml), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn wrong_envelope_is_malformed() {
        for xml in [
            "<html><body>502 Bad Gateway</body></html>",
            "<methodResponse/>",
            "<methodResponse><params></params></methodResponse>",
            "<methodResponse><params><param></param></params></methodResponse>",
            "<methodResponse><result/></methodResponse>",
        ] {
            assert!(
                matches!(decode_response(xml), Err(DecodeError::Malformed(_))),
                "{xml}"
            );
        }
    }

    #[test]
    fn bad_scalars_are_malformed() {
        for value in [
            "<value><int>seven</int></value>",
            "<value><double>x</double></value>",
            "<value><boolean>yes</boolean></value>",
            "<value><struct><member><value><int>1</int></value></member></struct></value>",
            "<value><integr>5</integr></value>",
            "<value><strct><member><name>id</name><value><int>1</int></value></member></strct></value>",
        ] {
            assert!(
                matches!(decode_response(&response(value)), Err(DecodeError::Malformed(_))),
                "{value}"
            );
        }
    }
}
