//! Serializable schema definitions.
//!
//! These are plain data, loaded from a schema document at startup and handed
//! to [`crate::TypeRegistry`], which validates and freezes them into a
//! [`crate::DescriptorPool`].

use serde::{Deserialize, Serialize};

use crate::kind::FieldKind;

/// One field of a message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
    /// Message type name, required when `kind` is `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Default value literal for singular scalar fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            repeated: false,
            type_name: None,
            default: None,
        }
    }

    /// A singular field holding a message of type `type_name`.
    pub fn message(name: impl Into<String>, number: u32, type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::new(name, number, FieldKind::Message)
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }
}

/// The fields of one message type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl MessageSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }
}

/// A named message type as it appears in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    #[serde(flatten)]
    pub schema: MessageSchema,
}

/// A schema document: every message type known to the process.
///
/// ```json
/// { "messages": [
///   { "name": "Person", "fields": [
///     { "name": "scores", "number": 1, "kind": "int32", "repeated": true }
///   ] }
/// ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSet {
    #[serde(default)]
    pub messages: Vec<SchemaEntry>,
}
