//! Text to field value conversion.
//!
//! Every conversion is locale independent and accepts the literal grammar that
//! [`Value`]'s `Display` produces, so `coerce(kind, value.to_string())`
//! returns `value` again.

use std::fmt;
use std::num::{IntErrorKind, ParseIntError};

use thiserror::Error;

use crate::kind::FieldKind;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionReason {
    /// Not a literal of the target kind.
    Syntax,
    /// A well-formed number that does not fit the target width.
    OutOfRange,
    /// String fields require UTF-8.
    InvalidUtf8,
    /// Message values are not converted from text here.
    NotPrimitive,
}

impl fmt::Display for ConversionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConversionReason::Syntax => "invalid literal",
            ConversionReason::OutOfRange => "out of range",
            ConversionReason::InvalidUtf8 => "invalid UTF-8",
            ConversionReason::NotPrimitive => "not a primitive kind",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot convert {text:?} to {kind}: {reason}")]
pub struct ConversionError {
    pub text: String,
    pub kind: FieldKind,
    pub reason: ConversionReason,
}

impl ConversionError {
    fn new(text: &str, kind: FieldKind, reason: ConversionReason) -> Self {
        Self {
            text: text.to_string(),
            kind,
            reason,
        }
    }

    fn from_int(text: &str, kind: FieldKind, err: ParseIntError) -> Self {
        let reason = match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ConversionReason::OutOfRange,
            _ => ConversionReason::Syntax,
        };
        Self::new(text, kind, reason)
    }
}

pub fn to_int32(text: &str) -> Result<i32, ConversionError> {
    text.parse()
        .map_err(|e| ConversionError::from_int(text, FieldKind::Int32, e))
}

pub fn to_int64(text: &str) -> Result<i64, ConversionError> {
    text.parse()
        .map_err(|e| ConversionError::from_int(text, FieldKind::Int64, e))
}

pub fn to_uint32(text: &str) -> Result<u32, ConversionError> {
    text.parse()
        .map_err(|e| ConversionError::from_int(text, FieldKind::Uint32, e))
}

pub fn to_uint64(text: &str) -> Result<u64, ConversionError> {
    text.parse()
        .map_err(|e| ConversionError::from_int(text, FieldKind::Uint64, e))
}

pub fn to_double(text: &str) -> Result<f64, ConversionError> {
    let value: f64 = text
        .parse()
        .map_err(|_| ConversionError::new(text, FieldKind::Double, ConversionReason::Syntax))?;
    if value.is_infinite() && !is_infinity_literal(text) {
        return Err(ConversionError::new(
            text,
            FieldKind::Double,
            ConversionReason::OutOfRange,
        ));
    }
    Ok(value)
}

pub fn to_float(text: &str) -> Result<f32, ConversionError> {
    let value: f32 = text
        .parse()
        .map_err(|_| ConversionError::new(text, FieldKind::Float, ConversionReason::Syntax))?;
    if value.is_infinite() && !is_infinity_literal(text) {
        return Err(ConversionError::new(
            text,
            FieldKind::Float,
            ConversionReason::OutOfRange,
        ));
    }
    Ok(value)
}

/// Accepts `true`, `false`, `1` and `0`.
pub fn to_bool(text: &str) -> Result<bool, ConversionError> {
    match text {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConversionError::new(
            text,
            FieldKind::Bool,
            ConversionReason::Syntax,
        )),
    }
}

pub fn to_string(raw: &[u8]) -> Result<String, ConversionError> {
    String::from_utf8(raw.to_vec()).map_err(|_| {
        ConversionError::new(
            &String::from_utf8_lossy(raw),
            FieldKind::String,
            ConversionReason::InvalidUtf8,
        )
    })
}

pub fn to_bytes(raw: &[u8]) -> Vec<u8> {
    raw.to_vec()
}

/// Convert a raw token to a value of `kind`.
///
/// # Example
///
/// ```
/// use protopath_reflect::coerce::coerce;
/// use protopath_reflect::{FieldKind, Value};
///
/// assert_eq!(coerce(FieldKind::Int32, b"-12").unwrap(), Value::Int32(-12));
/// assert!(coerce(FieldKind::Int32, b"abc").is_err());
/// assert!(coerce(FieldKind::Uint32, b"4294967296").is_err());
/// ```
pub fn coerce(kind: FieldKind, raw: &[u8]) -> Result<Value, ConversionError> {
    let text = || {
        std::str::from_utf8(raw).map_err(|_| {
            ConversionError::new(&String::from_utf8_lossy(raw), kind, ConversionReason::Syntax)
        })
    };
    Ok(match kind {
        FieldKind::Int32 => Value::Int32(to_int32(text()?)?),
        FieldKind::Int64 => Value::Int64(to_int64(text()?)?),
        FieldKind::Uint32 => Value::Uint32(to_uint32(text()?)?),
        FieldKind::Uint64 => Value::Uint64(to_uint64(text()?)?),
        FieldKind::Double => Value::Double(to_double(text()?)?),
        FieldKind::Float => Value::Float(to_float(text()?)?),
        FieldKind::Bool => Value::Bool(to_bool(text()?)?),
        FieldKind::String => Value::String(to_string(raw)?),
        FieldKind::Bytes => Value::Bytes(to_bytes(raw)),
        FieldKind::Message => {
            return Err(ConversionError::new(
                &String::from_utf8_lossy(raw),
                kind,
                ConversionReason::NotPrimitive,
            ))
        }
    })
}

fn is_infinity_literal(text: &str) -> bool {
    let digits = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    digits.eq_ignore_ascii_case("inf") || digits.eq_ignore_ascii_case("infinity")
}
