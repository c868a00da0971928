//! Creating message instances by type name.

use thiserror::Error;

use crate::codec::{json, wire, DecodeError};
use crate::descriptor::{DescriptorPool, MessageDescriptor};
use crate::message::DynamicMessage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FactoryError {
    #[error("unknown message type {0}")]
    UnknownType(String),
    #[error("cannot parse {type_name}: {source}")]
    Parse {
        type_name: String,
        #[source]
        source: DecodeError,
    },
}

/// Maps registered type names to fresh [`DynamicMessage`]s.
///
/// # Example
///
/// ```
/// use protopath_reflect::{FieldKind, FieldSchema, MessageSchema, ProtoFactory, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register_type(
///         "Person",
///         MessageSchema::new().field(FieldSchema::new("scores", 1, FieldKind::Int32).repeated()),
///     )
///     .unwrap();
/// let factory = ProtoFactory::new(registry.build().unwrap());
///
/// let msg = factory.create_from("Person", br#"{"scores": [1, 2]}"#).unwrap();
/// assert_eq!(msg.type_name(), "Person");
/// assert!(factory.create("Nobody").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ProtoFactory {
    pool: DescriptorPool,
}

impl ProtoFactory {
    pub fn new(pool: DescriptorPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.pool.contains(type_name)
    }

    /// Registered type names in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.pool.messages().map(|m| m.name().to_string()).collect()
    }

    pub fn descriptor(&self, type_name: &str) -> Result<MessageDescriptor, FactoryError> {
        self.pool
            .get_message(type_name)
            .ok_or_else(|| FactoryError::UnknownType(type_name.to_string()))
    }

    /// A new message with every field at its default.
    pub fn create(&self, type_name: &str) -> Result<DynamicMessage, FactoryError> {
        Ok(DynamicMessage::new(self.descriptor(type_name)?))
    }

    /// A new message parsed from `initial`.
    ///
    /// Input starting with `{` (after whitespace) is read as JSON, anything
    /// else as binary wire data.
    pub fn create_from(
        &self,
        type_name: &str,
        initial: &[u8],
    ) -> Result<DynamicMessage, FactoryError> {
        let desc = self.descriptor(type_name)?;
        Self::create_for(&desc, initial)
    }

    /// Like [`create_from`](Self::create_from) for an already resolved type.
    pub fn create_for(
        desc: &MessageDescriptor,
        initial: &[u8],
    ) -> Result<DynamicMessage, FactoryError> {
        parse(desc, initial).map_err(|source| FactoryError::Parse {
            type_name: desc.name().to_string(),
            source,
        })
    }
}

fn parse(desc: &MessageDescriptor, initial: &[u8]) -> Result<DynamicMessage, DecodeError> {
    let first = initial.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        let text = std::str::from_utf8(initial).map_err(|e| DecodeError::Json(e.to_string()))?;
        json::from_str(desc, text)
    } else {
        wire::decode(desc, initial)
    }
}
