//! Protobuf binary wire format.
//!
//! Integer and bool kinds are varints (negative `int32` values sign extended to
//! ten bytes), `double` is fixed64, `float` is fixed32, and strings, bytes and
//! messages are length delimited. Repeated scalars are written packed and read
//! both packed and unpacked. Unknown field numbers are skipped.

use prost::bytes::{Buf, BufMut};
use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, WireType};

use super::DecodeError;
use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::kind::FieldKind;
use crate::message::{DynamicMessage, FieldValue};
use crate::value::Value;

/// Wire type used for a single value of `kind`.
pub fn wire_type_of(kind: FieldKind) -> WireType {
    match kind {
        FieldKind::Int32
        | FieldKind::Int64
        | FieldKind::Uint32
        | FieldKind::Uint64
        | FieldKind::Bool => WireType::Varint,
        FieldKind::Double => WireType::SixtyFourBit,
        FieldKind::Float => WireType::ThirtyTwoBit,
        FieldKind::String | FieldKind::Bytes | FieldKind::Message => WireType::LengthDelimited,
    }
}

/// Serialize a message.
pub fn encode(msg: &DynamicMessage) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_message(msg, &mut buf);
    buf
}

fn encode_message(msg: &DynamicMessage, buf: &mut Vec<u8>) {
    for (field, slot) in msg.fields() {
        let number = field.number();
        match slot {
            FieldValue::Single(value) => {
                if field.default_value().as_ref() == Some(value) {
                    continue;
                }
                encode_key(number, wire_type_of(field.kind()), buf);
                encode_value(value, buf);
            }
            FieldValue::Message(Some(sub)) => {
                encode_key(number, WireType::LengthDelimited, buf);
                encode_nested(sub, buf);
            }
            FieldValue::Message(None) => {}
            FieldValue::Repeated(values) if values.is_empty() => {}
            FieldValue::Repeated(values) if field.kind().is_packable() => {
                let mut packed = Vec::new();
                for value in values {
                    encode_value(value, &mut packed);
                }
                encode_key(number, WireType::LengthDelimited, buf);
                encode_varint(packed.len() as u64, buf);
                buf.put_slice(&packed);
            }
            FieldValue::Repeated(values) => {
                for value in values {
                    encode_key(number, wire_type_of(field.kind()), buf);
                    encode_value(value, buf);
                }
            }
        }
    }
}

fn encode_nested(msg: &DynamicMessage, buf: &mut Vec<u8>) {
    let mut nested = Vec::new();
    encode_message(msg, &mut nested);
    encode_varint(nested.len() as u64, buf);
    buf.put_slice(&nested);
}

/// Value payload without its key.
fn encode_value(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Int32(v) => encode_varint(i64::from(*v) as u64, buf),
        Value::Int64(v) => encode_varint(*v as u64, buf),
        Value::Uint32(v) => encode_varint(u64::from(*v), buf),
        Value::Uint64(v) => encode_varint(*v, buf),
        Value::Bool(v) => encode_varint(u64::from(*v), buf),
        Value::Double(v) => buf.put_f64_le(*v),
        Value::Float(v) => buf.put_f32_le(*v),
        Value::String(v) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v.as_bytes());
        }
        Value::Bytes(v) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v);
        }
        Value::Message(msg) => encode_nested(msg, buf),
    }
}

/// Maximum nesting of embedded messages accepted by [`decode`].
pub const RECURSION_LIMIT: u32 = 100;

/// Parse a message of type `desc`.
///
/// The message is built from scratch and only returned when the whole input
/// decodes. Input nested deeper than [`RECURSION_LIMIT`] is rejected.
pub fn decode(desc: &MessageDescriptor, data: &[u8]) -> Result<DynamicMessage, DecodeError> {
    decode_message(desc, data, RECURSION_LIMIT)
}

fn decode_message(
    desc: &MessageDescriptor,
    data: &[u8],
    depth: u32,
) -> Result<DynamicMessage, DecodeError> {
    let mut msg = DynamicMessage::new(desc.clone());
    let mut buf = data;
    while buf.has_remaining() {
        let (number, wire_type) = decode_key(&mut buf)?;
        match desc.get_field_by_number(number) {
            Some(field) => decode_field(&field, wire_type, &mut buf, &mut msg, depth)?,
            None => skip_value(wire_type, &mut buf)?,
        }
    }
    Ok(msg)
}

fn decode_field(
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    msg: &mut DynamicMessage,
    depth: u32,
) -> Result<(), DecodeError> {
    let kind = field.kind();
    if field.is_repeated() && kind.is_packable() && wire_type == WireType::LengthDelimited {
        let len = decode_len(buf)?;
        let mut packed = take(buf, len)?;
        while packed.has_remaining() {
            let value = decode_value(field, &mut packed, depth)?;
            msg.push(field, value)?;
        }
        return Ok(());
    }

    if wire_type != wire_type_of(kind) {
        return Err(DecodeError::WireType {
            field: field.name().to_string(),
            found: wire_type,
        });
    }
    let value = decode_value(field, buf, depth)?;
    if field.is_repeated() {
        msg.push(field, value)?;
    } else {
        msg.set(field, value)?;
    }
    Ok(())
}

fn decode_value(
    field: &FieldDescriptor,
    buf: &mut &[u8],
    depth: u32,
) -> Result<Value, DecodeError> {
    Ok(match field.kind() {
        FieldKind::Int32 => Value::Int32(decode_varint(buf)? as i32),
        FieldKind::Int64 => Value::Int64(decode_varint(buf)? as i64),
        FieldKind::Uint32 => Value::Uint32(decode_varint(buf)? as u32),
        FieldKind::Uint64 => Value::Uint64(decode_varint(buf)?),
        FieldKind::Bool => Value::Bool(decode_varint(buf)? != 0),
        FieldKind::Double => {
            ensure_remaining(buf, 8)?;
            Value::Double(buf.get_f64_le())
        }
        FieldKind::Float => {
            ensure_remaining(buf, 4)?;
            Value::Float(buf.get_f32_le())
        }
        FieldKind::String => {
            let len = decode_len(buf)?;
            let bytes = take(buf, len)?;
            let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                field: field.name().to_string(),
            })?;
            Value::String(text.to_string())
        }
        FieldKind::Bytes => {
            let len = decode_len(buf)?;
            Value::Bytes(take(buf, len)?.to_vec())
        }
        FieldKind::Message => {
            let len = decode_len(buf)?;
            let bytes = take(buf, len)?;
            let desc = field
                .message_type()
                .ok_or_else(|| DecodeError::WireType {
                    field: field.name().to_string(),
                    found: WireType::LengthDelimited,
                })?;
            let depth = depth.checked_sub(1).ok_or(DecodeError::RecursionLimit)?;
            Value::Message(Box::new(decode_message(&desc, bytes, depth)?))
        }
    })
}

fn skip_value(wire_type: WireType, buf: &mut &[u8]) -> Result<(), DecodeError> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::SixtyFourBit => {
            take(buf, 8)?;
        }
        WireType::ThirtyTwoBit => {
            take(buf, 4)?;
        }
        WireType::LengthDelimited => {
            let len = decode_len(buf)?;
            take(buf, len)?;
        }
        WireType::StartGroup | WireType::EndGroup => return Err(DecodeError::Group),
    }
    Ok(())
}

fn decode_len(buf: &mut &[u8]) -> Result<usize, DecodeError> {
    let len = decode_varint(buf)?;
    usize::try_from(len).map_err(|_| DecodeError::Truncated)
}

fn ensure_remaining(buf: &[u8], len: usize) -> Result<(), DecodeError> {
    if buf.len() < len {
        return Err(DecodeError::Truncated);
    }
    Ok(())
}

fn take<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a [u8], DecodeError> {
    let slice: &'a [u8] = *buf;
    ensure_remaining(slice, len)?;
    let (head, tail) = slice.split_at(len);
    *buf = tail;
    Ok(head)
}
