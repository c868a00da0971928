//! Protobuf JSON mapping.
//!
//! Field names are used as JSON keys. Fields at their default are omitted on
//! output and `null` reads as the default. 64-bit integers are written as
//! strings and accepted as either strings or numbers, bytes are standard
//! base64, and non-finite floats use `"NaN"`, `"Infinity"` and `"-Infinity"`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value as JsonValue};

use super::DecodeError;
use crate::coerce::coerce;
use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::kind::FieldKind;
use crate::message::{DynamicMessage, FieldValue};
use crate::value::Value;

/// Render a message as a JSON object.
pub fn to_json(msg: &DynamicMessage) -> JsonValue {
    let mut map = Map::new();
    for (field, slot) in msg.fields() {
        let json = match slot {
            FieldValue::Single(value) => {
                if field.default_value().as_ref() == Some(value) {
                    continue;
                }
                value_to_json(value)
            }
            FieldValue::Message(Some(sub)) => to_json(sub),
            FieldValue::Message(None) => continue,
            FieldValue::Repeated(values) if values.is_empty() => continue,
            FieldValue::Repeated(values) => {
                JsonValue::Array(values.iter().map(value_to_json).collect())
            }
        };
        map.insert(field.name().to_string(), json);
    }
    JsonValue::Object(map)
}

/// Render a message as compact JSON text.
pub fn to_string(msg: &DynamicMessage) -> String {
    to_json(msg).to_string()
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Int32(v) => JsonValue::from(*v),
        Value::Uint32(v) => JsonValue::from(*v),
        Value::Int64(v) => JsonValue::String(v.to_string()),
        Value::Uint64(v) => JsonValue::String(v.to_string()),
        Value::Double(v) => float_to_json(*v),
        // Widen through the shortest f32 text so 0.1f32 prints as 0.1.
        Value::Float(v) => float_to_json(v.to_string().parse().unwrap_or(f64::from(*v))),
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::String(v) => JsonValue::String(v.clone()),
        Value::Bytes(v) => JsonValue::String(STANDARD.encode(v)),
        Value::Message(msg) => to_json(msg),
    }
}

fn float_to_json(v: f64) -> JsonValue {
    match Number::from_f64(v) {
        Some(n) => JsonValue::Number(n),
        None if v.is_nan() => JsonValue::String("NaN".into()),
        None if v > 0.0 => JsonValue::String("Infinity".into()),
        None => JsonValue::String("-Infinity".into()),
    }
}

/// Build a message of type `desc` from a JSON object.
pub fn from_json(desc: &MessageDescriptor, json: &JsonValue) -> Result<DynamicMessage, DecodeError> {
    let object = json.as_object().ok_or_else(|| DecodeError::JsonType {
        field: desc.name().to_string(),
        expected: "object",
    })?;
    let mut msg = DynamicMessage::new(desc.clone());
    for (key, item) in object {
        let field = desc
            .get_field_by_name(key)
            .ok_or_else(|| DecodeError::UnknownField {
                message: desc.name().to_string(),
                name: key.clone(),
            })?;
        if item.is_null() {
            continue;
        }
        if field.is_repeated() {
            let items = item.as_array().ok_or_else(|| DecodeError::JsonType {
                field: field.name().to_string(),
                expected: "array",
            })?;
            for element in items {
                let value = value_from_json(&field, element)?;
                msg.push(&field, value)?;
            }
        } else {
            let value = value_from_json(&field, item)?;
            msg.set(&field, value)?;
        }
    }
    Ok(msg)
}

/// Parse JSON text into a message of type `desc`.
pub fn from_str(desc: &MessageDescriptor, text: &str) -> Result<DynamicMessage, DecodeError> {
    let json: JsonValue =
        serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;
    from_json(desc, &json)
}

fn value_from_json(field: &FieldDescriptor, json: &JsonValue) -> Result<Value, DecodeError> {
    let mismatch = |expected| DecodeError::JsonType {
        field: field.name().to_string(),
        expected,
    };
    let convert = |text: &str| {
        coerce(field.kind(), text.as_bytes()).map_err(|source| DecodeError::Conversion {
            field: field.name().to_string(),
            source,
        })
    };
    match field.kind() {
        FieldKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(|| mismatch("bool")),
        FieldKind::String => json
            .as_str()
            .map(Value::from)
            .ok_or_else(|| mismatch("string")),
        FieldKind::Bytes => {
            let text = json.as_str().ok_or_else(|| mismatch("base64 string"))?;
            STANDARD
                .decode(text)
                .map(Value::Bytes)
                .map_err(|_| DecodeError::Base64 {
                    field: field.name().to_string(),
                })
        }
        FieldKind::Message => {
            let desc = field.message_type().ok_or_else(|| mismatch("message"))?;
            Ok(Value::from(from_json(&desc, json)?))
        }
        kind => match json {
            JsonValue::Number(n) => convert(&n.to_string()),
            JsonValue::String(s) if kind.is_float() => convert(non_finite_literal(s)),
            JsonValue::String(s) => convert(s),
            _ => Err(mismatch("number")),
        },
    }
}

fn non_finite_literal(text: &str) -> &str {
    match text {
        "Infinity" => "inf",
        "-Infinity" => "-inf",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::schema::{FieldSchema, MessageSchema};
    use crate::DescriptorPool;
    use serde_json::json;

    fn pool() -> DescriptorPool {
        let mut registry = TypeRegistry::new();
        registry
            .register_type(
                "Sample",
                MessageSchema::new()
                    .field(FieldSchema::new("i", 1, FieldKind::Int32))
                    .field(FieldSchema::new("big", 2, FieldKind::Int64))
                    .field(FieldSchema::new("u", 3, FieldKind::Uint64))
                    .field(FieldSchema::new("d", 4, FieldKind::Double))
                    .field(FieldSchema::new("f", 5, FieldKind::Float))
                    .field(FieldSchema::new("ok", 6, FieldKind::Bool))
                    .field(FieldSchema::new("raw", 7, FieldKind::Bytes))
                    .field(FieldSchema::new("tags", 8, FieldKind::String).repeated())
                    .field(FieldSchema::message("child", 9, "Sample")),
            )
            .unwrap();
        registry.build().unwrap()
    }

    #[test]
    fn test_defaults_are_omitted() {
        let pool = pool();
        let msg = DynamicMessage::new(pool.get_message("Sample").unwrap());
        assert_eq!(to_json(&msg), json!({}));
    }

    #[test]
    fn test_scalar_mapping() {
        let pool = pool();
        let desc = pool.get_message("Sample").unwrap();
        let msg = from_json(
            &desc,
            &json!({
                "i": -3,
                "big": "9007199254740993",
                "u": 7,
                "d": "NaN",
                "f": 0.1,
                "ok": true,
                "raw": "AP8=",
                "tags": ["a", "b"]
            }),
        )
        .unwrap();
        let out = to_json(&msg);
        assert_eq!(out["i"], json!(-3));
        assert_eq!(out["big"], json!("9007199254740993"));
        assert_eq!(out["u"], json!("7"));
        assert_eq!(out["d"], json!("NaN"));
        assert_eq!(out["f"], json!(0.1));
        assert_eq!(out["ok"], json!(true));
        assert_eq!(out["raw"], json!("AP8="));
        assert_eq!(out["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_infinity_strings() {
        let pool = pool();
        let desc = pool.get_message("Sample").unwrap();
        let msg = from_json(&desc, &json!({ "d": "-Infinity", "f": "Infinity" })).unwrap();
        let out = to_json(&msg);
        assert_eq!(out["d"], json!("-Infinity"));
        assert_eq!(out["f"], json!("Infinity"));
    }

    #[test]
    fn test_nested_roundtrip() {
        let pool = pool();
        let desc = pool.get_message("Sample").unwrap();
        let doc = json!({ "i": 1, "child": { "tags": ["x"], "child": { "ok": true } } });
        let msg = from_json(&desc, &doc).unwrap();
        assert_eq!(to_json(&msg), doc);
        assert_eq!(from_str(&desc, &to_string(&msg)).unwrap(), msg);
    }

    #[test]
    fn test_null_reads_as_default() {
        let pool = pool();
        let desc = pool.get_message("Sample").unwrap();
        let msg = from_json(&desc, &json!({ "i": null, "tags": null })).unwrap();
        assert_eq!(msg, DynamicMessage::new(desc));
    }

    #[test]
    fn test_errors() {
        let pool = pool();
        let desc = pool.get_message("Sample").unwrap();
        assert!(matches!(
            from_json(&desc, &json!([])),
            Err(DecodeError::JsonType { expected: "object", .. })
        ));
        assert_eq!(
            from_json(&desc, &json!({ "nope": 1 })),
            Err(DecodeError::UnknownField {
                message: "Sample".into(),
                name: "nope".into()
            })
        );
        assert!(matches!(
            from_json(&desc, &json!({ "tags": "a" })),
            Err(DecodeError::JsonType { expected: "array", .. })
        ));
        assert!(matches!(
            from_json(&desc, &json!({ "i": 1.5 })),
            Err(DecodeError::Conversion { .. })
        ));
        assert!(matches!(
            from_json(&desc, &json!({ "i": 4294967296u64 })),
            Err(DecodeError::Conversion { .. })
        ));
        assert!(matches!(
            from_json(&desc, &json!({ "ok": "true" })),
            Err(DecodeError::JsonType { expected: "bool", .. })
        ));
        assert!(matches!(
            from_json(&desc, &json!({ "raw": "!!" })),
            Err(DecodeError::Base64 { .. })
        ));
        assert!(matches!(
            from_str(&desc, "{"),
            Err(DecodeError::Json(_))
        ));
    }
}
