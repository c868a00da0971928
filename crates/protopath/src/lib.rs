//! Path-addressable field access for dynamic messages.
//!
//! - [`FieldRef`] resolves a [`Path`] against a live [`DynamicMessage`] and
//!   mutates the field it lands on.
//! - [`AppendCommand`] appends typed values parsed from text to a repeated
//!   field of a message held in a [`MessageStore`].
//!
//! # Example
//!
//! ```
//! use protopath::{AppendCommand, MemoryStore};
//! use protopath_reflect::{FieldKind, FieldSchema, MessageSchema, ProtoFactory, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! registry
//!     .register_type(
//!         "Person",
//!         MessageSchema::new().field(FieldSchema::new("scores", 1, FieldKind::Int32).repeated()),
//!     )
//!     .unwrap();
//! let factory = ProtoFactory::new(registry.build().unwrap());
//! let mut store = MemoryStore::new();
//!
//! let argv: [&[u8]; 6] = [b"APPEND", b"k", b"Person", b"scores", b"10", b"20"];
//! let len = AppendCommand::new(&factory).execute(&mut store, &argv).unwrap();
//! assert_eq!(len, 2);
//! ```

pub mod command;
pub mod field_ref;
pub mod store;

pub use command::{AppendArgs, AppendCommand, CommandError};
pub use field_ref::{FieldRef, FieldRefError, Location};
pub use store::{MemoryStore, MessageStore};

pub use protopath_path::{Path, PathSyntaxError, Segment};
pub use protopath_reflect::{DynamicMessage, FieldKind, ProtoFactory, Value};
