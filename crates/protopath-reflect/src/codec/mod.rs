//! Message codecs.
//!
//! - [`wire`]: protobuf binary wire format.
//! - [`json`]: protobuf JSON mapping on top of `serde_json::Value`.

use thiserror::Error;

use crate::coerce::ConversionError;
use crate::message::MessageError;

pub mod json;
pub mod wire;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid wire data: {0}")]
    Wire(String),
    #[error("truncated input")]
    Truncated,
    #[error("message nesting too deep")]
    RecursionLimit,
    #[error("groups are not supported")]
    Group,
    #[error("field {field}: unexpected wire type {found:?}")]
    WireType {
        field: String,
        found: prost::encoding::WireType,
    },
    #[error("field {field}: invalid UTF-8")]
    InvalidUtf8 { field: String },
    #[error("invalid json: {0}")]
    Json(String),
    #[error("unknown field {name:?} in {message}")]
    UnknownField { message: String, name: String },
    #[error("field {field}: expected {expected}")]
    JsonType {
        field: String,
        expected: &'static str,
    },
    #[error("field {field}: invalid base64")]
    Base64 { field: String },
    #[error("field {field}: {source}")]
    Conversion {
        field: String,
        #[source]
        source: ConversionError,
    },
    #[error(transparent)]
    Message(#[from] MessageError),
}

impl From<prost::DecodeError> for DecodeError {
    fn from(err: prost::DecodeError) -> Self {
        DecodeError::Wire(err.to_string())
    }
}
