//! Native field values.

use std::fmt;

use crate::codec::json::to_json;
use crate::kind::FieldKind;
use crate::message::DynamicMessage;

/// A single field value, one variant per [`FieldKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Double(f64),
    Float(f32),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Message(Box<DynamicMessage>),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Int32(_) => FieldKind::Int32,
            Value::Int64(_) => FieldKind::Int64,
            Value::Uint32(_) => FieldKind::Uint32,
            Value::Uint64(_) => FieldKind::Uint64,
            Value::Double(_) => FieldKind::Double,
            Value::Float(_) => FieldKind::Float,
            Value::Bool(_) => FieldKind::Bool,
            Value::String(_) => FieldKind::String,
            Value::Bytes(_) => FieldKind::Bytes,
            Value::Message(_) => FieldKind::Message,
        }
    }

    /// The zero value of a scalar kind. `None` for [`FieldKind::Message`].
    pub fn zero(kind: FieldKind) -> Option<Value> {
        Some(match kind {
            FieldKind::Int32 => Value::Int32(0),
            FieldKind::Int64 => Value::Int64(0),
            FieldKind::Uint32 => Value::Uint32(0),
            FieldKind::Uint64 => Value::Uint64(0),
            FieldKind::Double => Value::Double(0.0),
            FieldKind::Float => Value::Float(0.0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::String => Value::String(String::new()),
            FieldKind::Bytes => Value::Bytes(Vec::new()),
            FieldKind::Message => return None,
        })
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }
}

/// Canonical text form; [`crate::coerce::coerce`] parses it back to the same value.
///
/// Messages print as compact JSON, bytes print lossily as UTF-8.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Value::Message(msg) => write!(f, "{}", to_json(msg)),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DynamicMessage> for Value {
    fn from(v: DynamicMessage) -> Self {
        Value::Message(Box::new(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Value::from(1i32).kind(), FieldKind::Int32);
        assert_eq!(Value::from(1u64).kind(), FieldKind::Uint64);
        assert_eq!(Value::from(1.5f32).kind(), FieldKind::Float);
        assert_eq!(Value::from("x").kind(), FieldKind::String);
        assert_eq!(Value::from(vec![1u8]).kind(), FieldKind::Bytes);
    }

    #[test]
    fn test_zero_values() {
        for kind in FieldKind::ALL {
            match Value::zero(kind) {
                Some(v) => assert_eq!(v.kind(), kind),
                None => assert_eq!(kind, FieldKind::Message),
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int32(-7).to_string(), "-7");
        assert_eq!(Value::Uint64(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Value::Double(0.5).to_string(), "0.5");
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("s").as_message(), None);
    }
}
