use protopath_reflect::codec::{json, wire};
use protopath_reflect::{
    DynamicMessage, FieldKind, FieldValue, ProtoFactory, TypeRegistry, Value,
};
use serde_json::json;

const SCHEMA: &str = r#"{
  "messages": [
    { "name": "Person", "fields": [
      { "name": "name", "number": 1, "kind": "string" },
      { "name": "scores", "number": 2, "kind": "int32", "repeated": true },
      { "name": "address", "number": 3, "kind": "message", "type_name": "Address" },
      { "name": "age", "number": 4, "kind": "int32", "default": "18" },
      { "name": "friends", "number": 5, "kind": "message", "type_name": "Person", "repeated": true },
      { "name": "id", "number": 6, "kind": "uint64" },
      { "name": "weight", "number": 7, "kind": "float" },
      { "name": "avatar", "number": 8, "kind": "bytes" },
      { "name": "active", "number": 9, "kind": "bool" }
    ] },
    { "name": "Address", "fields": [
      { "name": "city", "number": 1, "kind": "string" },
      { "name": "lines", "number": 2, "kind": "string", "repeated": true }
    ] }
  ]
}"#;

fn factory() -> ProtoFactory {
    let registry = TypeRegistry::from_json_str(SCHEMA).expect("schema");
    ProtoFactory::new(registry.build().expect("build"))
}

fn fixtures() -> Vec<serde_json::Value> {
    vec![
        json!({}),
        json!({ "name": "ada", "scores": [1, -2, 300] }),
        json!({ "address": { "city": "Oslo", "lines": ["a", "b"] } }),
        json!({ "age": 0, "id": "18446744073709551615", "weight": 1.5, "active": true }),
        json!({ "avatar": "3q2+7w==", "friends": [ { "name": "bob" }, {} ] }),
        json!({ "friends": [ { "friends": [ { "scores": [7] } ] } ] }),
    ]
}

#[test]
fn codec_wire_and_json_agree_on_fixtures() {
    let factory = factory();
    let desc = factory.descriptor("Person").unwrap();
    for fixture in fixtures() {
        let msg = json::from_json(&desc, &fixture).expect("fixture parses");
        let bytes = wire::encode(&msg);
        let decoded = wire::decode(&desc, &bytes).expect("wire decodes");
        assert_eq!(decoded, msg, "wire round trip for {fixture}");
        assert_eq!(json::to_json(&decoded), fixture, "json round trip for {fixture}");
    }
}

#[test]
fn codec_explicit_default_is_not_emitted() {
    let factory = factory();
    let desc = factory.descriptor("Person").unwrap();
    let msg = json::from_json(&desc, &json!({ "age": 18, "name": "" })).unwrap();
    assert_eq!(json::to_json(&msg), json!({}));
    assert!(wire::encode(&msg).is_empty());
}

#[test]
fn codec_non_default_zero_is_emitted() {
    let factory = factory();
    let desc = factory.descriptor("Person").unwrap();
    // age defaults to 18, so an explicit 0 must survive both codecs
    let msg = json::from_json(&desc, &json!({ "age": 0 })).unwrap();
    assert_eq!(wire::encode(&msg), vec![0x20, 0x00]);
    let decoded = wire::decode(&desc, &[0x20, 0x00]).unwrap();
    assert_eq!(decoded.get_by_name("age"), Some(&FieldValue::Single(Value::Int32(0))));
}

#[test]
fn codec_factory_sniffs_input_format() {
    let factory = factory();
    let desc = factory.descriptor("Person").unwrap();
    let msg = json::from_json(&desc, &json!({ "name": "ada", "scores": [5] })).unwrap();

    let text = json::to_string(&msg);
    assert_eq!(factory.create_from("Person", text.as_bytes()).unwrap(), msg);
    assert_eq!(factory.create_from("Person", &wire::encode(&msg)).unwrap(), msg);
}

#[test]
fn codec_repeated_messages_keep_order() {
    let factory = factory();
    let desc = factory.descriptor("Person").unwrap();
    let friends = desc.get_field_by_name("friends").unwrap();
    let name = desc.get_field_by_name("name").unwrap();

    let mut msg = DynamicMessage::new(desc.clone());
    for who in ["a", "b", "c"] {
        let mut friend = factory.create("Person").unwrap();
        friend.set(&name, Value::from(who)).unwrap();
        msg.push(&friends, Value::from(friend)).unwrap();
    }
    let decoded = wire::decode(&desc, &wire::encode(&msg)).unwrap();
    let names: Vec<_> = decoded
        .list(&friends)
        .unwrap()
        .iter()
        .map(|v| v.as_message().unwrap().get(&name).cloned())
        .collect();
    assert_eq!(
        names,
        ["a", "b", "c"]
            .map(|s| Some(FieldValue::Single(Value::from(s))))
            .to_vec()
    );
}

#[test]
fn codec_schema_kinds_survive_registry() {
    let factory = factory();
    let desc = factory.descriptor("Person").unwrap();
    let kinds: Vec<_> = desc.fields().map(|f| f.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::String,
            FieldKind::Int32,
            FieldKind::Message,
            FieldKind::Int32,
            FieldKind::Message,
            FieldKind::Uint64,
            FieldKind::Float,
            FieldKind::Bytes,
            FieldKind::Bool,
        ]
    );
}
