//! Verify the codec against JSON test vectors stored in `test-vectors/`.
//!
//! Parameters and expected values are written as JSON and coerced into
//! `Value` with the same rules call sites use, so a vector reads the way a
//! caller would write it.

use erp_xmlrpc::{decode_response, encode_call, DecodeError, Value};

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

#[test]
fn encode_test_vectors() {
    let raw = include_str!("../../test-vectors/encode.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = case["method"].as_str().unwrap();
        let params: Vec<Value> = case["params"]
            .as_array()
            .unwrap()
            .iter()
            .cloned()
            .map(Value::from)
            .collect();

        let xml = encode_call(method, &params);
        assert_eq!(xml, case["expected_xml"].as_str().unwrap(), "{name}: xml");
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[test]
fn decode_test_vectors() {
    let raw = include_str!("../../test-vectors/decode.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = decode_response(case["body"].as_str().unwrap());

        if let Some(fault) = case.get("expected_fault") {
            let expected = DecodeError::Fault {
                code: fault["code"].as_i64().unwrap(),
                message: fault["message"].as_str().unwrap().to_string(),
            };
            assert_eq!(result.unwrap_err(), expected, "{name}: fault");
        } else if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Malformed" => assert!(matches!(err, DecodeError::Malformed(_)), "{name}: expected Malformed"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let expected = Value::from(case["expected"].clone());
            assert_eq!(result.unwrap(), expected, "{name}: decoded value");
        }
    }
}
