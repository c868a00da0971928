use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of a message field.
///
/// Serialized in schema files as the proto type keyword (`"int32"`,
/// `"string"`, `"message"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Double,
    Float,
    Bool,
    String,
    Bytes,
    Message,
}

impl FieldKind {
    pub const ALL: [FieldKind; 10] = [
        FieldKind::Int32,
        FieldKind::Int64,
        FieldKind::Uint32,
        FieldKind::Uint64,
        FieldKind::Double,
        FieldKind::Float,
        FieldKind::Bool,
        FieldKind::String,
        FieldKind::Bytes,
        FieldKind::Message,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Double => "double",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Double | Self::Float)
    }

    /// Kinds whose repeated fields use packed encoding on the wire.
    pub fn is_packable(self) -> bool {
        !matches!(self, Self::String | Self::Bytes | Self::Message)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
