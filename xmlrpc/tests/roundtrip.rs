//! Property tests: anything the encoder writes, the decoder reads back.

use erp_xmlrpc::{decode_response, decode_value, encode_call, encode_value, xml, Value};
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 <>&'\"]{0,12}".prop_map(Value::Str),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Double),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z_]{1,8}", inner), 0..6).prop_map(Value::Struct),
        ]
    })
}

fn wrap_as_response(value: &Value) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><params><param>{}</param></params></methodResponse>",
        encode_value(value)
    )
}

proptest! {
    #[test]
    fn response_roundtrip(value in arb_value()) {
        let decoded = decode_response(&wrap_as_response(&value)).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn call_params_roundtrip(method in "[a-z_.]{1,16}", params in prop::collection::vec(arb_value(), 0..4)) {
        let root = xml::parse(&encode_call(&method, &params)).unwrap();
        prop_assert_eq!(root.name.as_str(), "methodCall");
        prop_assert_eq!(root.child("methodName").unwrap().text.as_str(), method.as_str());

        let decoded = root
            .child("params")
            .unwrap()
            .children_named("param")
            .map(|p| decode_value(p.child("value").unwrap()).unwrap())
            .collect::<Vec<_>>();
        prop_assert_eq!(decoded, params);
    }
}
