//! Message type registration.
//!
//! [`TypeRegistry`] collects named [`MessageSchema`]s, checking each one as it
//! is registered. [`TypeRegistry::build`] resolves message references between
//! types and freezes the result into a [`DescriptorPool`].

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::coerce::{coerce, ConversionError};
use crate::descriptor::{DescriptorPool, FieldInfo, MessageInfo, PoolInner};
use crate::kind::FieldKind;
use crate::schema::{MessageSchema, SchemaSet};

/// Largest field number the wire format can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("type {0} is already registered")]
    DuplicateType(String),
    #[error("type name must not be empty")]
    EmptyTypeName,
    #[error("{message}: duplicate field name {field}")]
    DuplicateFieldName { message: String, field: String },
    #[error("{message}: field number {number} is used twice")]
    DuplicateFieldNumber { message: String, number: u32 },
    #[error("{message}.{field}: field number {number} is out of range")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: u32,
    },
    #[error("{message}: invalid field name {field:?}")]
    InvalidFieldName { message: String, field: String },
    #[error("{message}.{field}: type_name is only valid on message fields")]
    UnexpectedTypeName { message: String, field: String },
    #[error("{message}.{field}: message fields need a type_name")]
    MissingTypeName { message: String, field: String },
    #[error("{message}.{field}: {reason}")]
    InvalidDefault {
        message: String,
        field: String,
        reason: String,
    },
    #[error("{message}.{field}: bad default: {source}")]
    DefaultConversion {
        message: String,
        field: String,
        #[source]
        source: ConversionError,
    },
    #[error("{message}.{field}: unknown message type {type_name}")]
    UnresolvedType {
        message: String,
        field: String,
        type_name: String,
    },
    #[error("invalid schema document: {0}")]
    Schema(String),
}

/// Mutable set of message types, frozen by [`TypeRegistry::build`].
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, MessageSchema>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every message of a schema document.
    pub fn from_schema_set(set: SchemaSet) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entry in set.messages {
            registry.register_type(entry.name, entry.schema)?;
        }
        Ok(registry)
    }

    /// Parse and register a JSON schema document.
    pub fn from_json_str(text: &str) -> Result<Self, RegistryError> {
        let set: SchemaSet =
            serde_json::from_str(text).map_err(|e| RegistryError::Schema(e.to_string()))?;
        Self::from_schema_set(set)
    }

    /// Add a message type.
    ///
    /// Field references to other message types are checked by [`build`](Self::build),
    /// so types may be registered in any order.
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        schema: MessageSchema,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyTypeName);
        }
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateType(name));
        }
        check_schema(&name, &schema)?;
        self.types.insert(name, schema);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve message references and freeze the registry.
    pub fn build(&self) -> Result<DescriptorPool, RegistryError> {
        let mut messages = IndexMap::with_capacity(self.types.len());
        for (name, schema) in &self.types {
            let mut fields = IndexMap::with_capacity(schema.fields.len());
            let mut by_number = HashMap::with_capacity(schema.fields.len());
            for (index, field) in schema.fields.iter().enumerate() {
                let message_type = match &field.type_name {
                    Some(type_name) => Some(self.types.get_index_of(type_name).ok_or_else(
                        || RegistryError::UnresolvedType {
                            message: name.clone(),
                            field: field.name.clone(),
                            type_name: type_name.clone(),
                        },
                    )?),
                    None => None,
                };
                let default = match &field.default {
                    Some(literal) => Some(coerce(field.kind, literal.as_bytes()).map_err(
                        |source| RegistryError::DefaultConversion {
                            message: name.clone(),
                            field: field.name.clone(),
                            source,
                        },
                    )?),
                    None => None,
                };
                by_number.insert(field.number, index);
                fields.insert(
                    field.name.clone(),
                    FieldInfo {
                        name: field.name.clone(),
                        number: field.number,
                        kind: field.kind,
                        repeated: field.repeated,
                        message_type,
                        default,
                    },
                );
            }
            debug!(type_name = %name, fields = fields.len(), "registered message type");
            messages.insert(
                name.clone(),
                MessageInfo {
                    name: name.clone(),
                    fields,
                    by_number,
                },
            );
        }
        Ok(DescriptorPool::new(PoolInner { messages }))
    }
}

fn check_schema(message: &str, schema: &MessageSchema) -> Result<(), RegistryError> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();
    for field in &schema.fields {
        let at = || (message.to_string(), field.name.clone());
        if field.name.is_empty() || field.name.contains(['.', '[', ']']) {
            let (message, field) = at();
            return Err(RegistryError::InvalidFieldName { message, field });
        }
        if !names.insert(field.name.as_str()) {
            let (message, field) = at();
            return Err(RegistryError::DuplicateFieldName { message, field });
        }
        if field.number == 0 || field.number > MAX_FIELD_NUMBER {
            let (message, name) = at();
            return Err(RegistryError::InvalidFieldNumber {
                message,
                field: name,
                number: field.number,
            });
        }
        if !numbers.insert(field.number) {
            return Err(RegistryError::DuplicateFieldNumber {
                message: message.to_string(),
                number: field.number,
            });
        }
        match (field.kind, &field.type_name) {
            (FieldKind::Message, None) => {
                let (message, field) = at();
                return Err(RegistryError::MissingTypeName { message, field });
            }
            (kind, Some(_)) if kind != FieldKind::Message => {
                let (message, field) = at();
                return Err(RegistryError::UnexpectedTypeName { message, field });
            }
            _ => {}
        }
        if let Some(literal) = &field.default {
            let reason = if field.repeated {
                Some("repeated fields cannot have a default")
            } else if field.kind == FieldKind::Message {
                Some("message fields cannot have a default")
            } else {
                None
            };
            if let Some(reason) = reason {
                let (message, field) = at();
                return Err(RegistryError::InvalidDefault {
                    message,
                    field,
                    reason: reason.to_string(),
                });
            }
            if let Err(source) = coerce(field.kind, literal.as_bytes()) {
                let (message, field) = at();
                return Err(RegistryError::DefaultConversion {
                    message,
                    field,
                    source,
                });
            }
        }
    }
    Ok(())
}
