//! Reflective message runtime.
//!
//! Message types are described at runtime: a [`TypeRegistry`] is filled with
//! [`MessageSchema`]s (in code or from a JSON schema document), then frozen
//! into a [`DescriptorPool`]. [`DynamicMessage`]s are created from the pool
//! through a [`ProtoFactory`] and read or written field by field through
//! [`FieldDescriptor`]s.
//!
//! # Example
//!
//! ```
//! use protopath_reflect::{FieldKind, FieldSchema, MessageSchema, TypeRegistry, Value};
//!
//! let mut registry = TypeRegistry::new();
//! registry
//!     .register_type(
//!         "Person",
//!         MessageSchema::new()
//!             .field(FieldSchema::new("name", 1, FieldKind::String))
//!             .field(FieldSchema::new("scores", 2, FieldKind::Int32).repeated()),
//!     )
//!     .unwrap();
//! let pool = registry.build().unwrap();
//!
//! let person = pool.get_message("Person").unwrap();
//! let scores = person.get_field_by_name("scores").unwrap();
//! let mut msg = protopath_reflect::DynamicMessage::new(person);
//! assert_eq!(msg.push(&scores, Value::Int32(7)).unwrap(), 1);
//! ```

pub mod codec;
pub mod coerce;
mod descriptor;
mod factory;
mod kind;
mod message;
mod registry;
mod schema;
mod value;

pub use codec::DecodeError;
pub use coerce::{ConversionError, ConversionReason};
pub use descriptor::{DescriptorPool, FieldDescriptor, MessageDescriptor};
pub use factory::{FactoryError, ProtoFactory};
pub use kind::FieldKind;
pub use message::{check_value, DynamicMessage, FieldValue, MessageError};
pub use registry::{RegistryError, TypeRegistry, MAX_FIELD_NUMBER};
pub use schema::{FieldSchema, MessageSchema, SchemaEntry, SchemaSet};
pub use value::Value;
