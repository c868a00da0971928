//! The append command: `APPEND key type path element [element ...]`.
//!
//! Appends typed values parsed from text to the repeated field at `path` of
//! the message stored under `key`, creating a message of `type` when the key
//! is absent. The path is checked and every element is converted before the
//! message is touched, so a failed append leaves it unchanged.

use protopath_path::{Path, PathSyntaxError};
use protopath_reflect::coerce::coerce;
use protopath_reflect::{
    ConversionError, DynamicMessage, FactoryError, FieldDescriptor, FieldKind, ProtoFactory,
    Value,
};
use thiserror::Error;
use tracing::debug;

use crate::field_ref::{FieldRefError, Location};
use crate::store::MessageStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),
    #[error("Operation against a key holding the wrong kind of value (expected {expected}, found {found})")]
    WrongType { expected: String, found: String },
    #[error(transparent)]
    Path(#[from] PathSyntaxError),
    #[error(transparent)]
    FieldRef(#[from] FieldRefError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl CommandError {
    /// The error line sent back to the client.
    pub fn reply_text(&self) -> String {
        match self {
            CommandError::WrongType { .. } => format!("WRONGTYPE {self}"),
            _ => format!("ERR {self}"),
        }
    }
}

/// Parsed arguments of one append invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendArgs {
    pub key: Vec<u8>,
    pub type_name: String,
    pub path: Path,
    pub elements: Vec<Vec<u8>>,
}

impl AppendArgs {
    /// Parse `[command, key, type, path, element...]`.
    pub fn parse(argv: &[&[u8]]) -> Result<Self, CommandError> {
        match argv {
            [_, key, type_name, path, elements @ ..] if !elements.is_empty() => Ok(Self {
                key: key.to_vec(),
                type_name: String::from_utf8_lossy(type_name).into_owned(),
                path: Path::parse(&String::from_utf8_lossy(path))?,
                elements: elements.iter().map(|e| e.to_vec()).collect(),
            }),
            _ => {
                let command = argv
                    .first()
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .unwrap_or_default();
                Err(CommandError::WrongArity(command))
            }
        }
    }
}

/// Runs appends against a [`MessageStore`] using one [`ProtoFactory`].
#[derive(Debug, Clone, Copy)]
pub struct AppendCommand<'f> {
    factory: &'f ProtoFactory,
}

impl<'f> AppendCommand<'f> {
    pub fn new(factory: &'f ProtoFactory) -> Self {
        Self { factory }
    }

    /// Parse `argv` and run it.
    pub fn execute<S: MessageStore + ?Sized>(
        &self,
        store: &mut S,
        argv: &[&[u8]],
    ) -> Result<usize, CommandError> {
        let args = AppendArgs::parse(argv)?;
        self.run(store, &args)
    }

    /// Append `args.elements`, returning the new length of the array.
    ///
    /// A new message is only installed in `store` when every element was
    /// appended.
    pub fn run<S: MessageStore + ?Sized>(
        &self,
        store: &mut S,
        args: &AppendArgs,
    ) -> Result<usize, CommandError> {
        if let Some(msg) = store.get_mut(&args.key) {
            if msg.type_name() != args.type_name {
                return Err(CommandError::WrongType {
                    expected: args.type_name.clone(),
                    found: msg.type_name().to_string(),
                });
            }
            let len = self.append(msg, args)?;
            debug!(type_name = %args.type_name, path = %args.path, len, "appended to existing message");
            return Ok(len);
        }

        let mut msg = self.factory.create(&args.type_name)?;
        let len = self.append(&mut msg, args)?;
        debug!(type_name = %args.type_name, path = %args.path, len, "created message");
        store.insert(args.key.clone(), msg);
        Ok(len)
    }

    fn append(&self, msg: &mut DynamicMessage, args: &AppendArgs) -> Result<usize, CommandError> {
        let location = Location::locate(msg, &args.path)?;
        if location.is_array_element() {
            return Err(FieldRefError::InvalidOperation("cannot append to an array element").into());
        }
        let field = match location.field() {
            Some(field) if location.is_array() => field.clone(),
            _ => {
                return Err(FieldRefError::NotArray {
                    field: args.path.to_string(),
                }
                .into())
            }
        };

        let values = args
            .elements
            .iter()
            .map(|raw| self.convert(&field, raw))
            .collect::<Result<Vec<_>, _>>()?;
        let mut field_ref = location.bind(msg)?;
        for value in values {
            field_ref.add(value)?;
        }
        Ok(field_ref.array_size()?)
    }

    fn convert(&self, field: &FieldDescriptor, raw: &[u8]) -> Result<Value, CommandError> {
        if field.kind() != FieldKind::Message {
            return Ok(coerce(field.kind(), raw)?);
        }
        let desc = field.message_type().ok_or(FieldRefError::NotMessage {
            field: field.name().to_string(),
        })?;
        Ok(Value::from(ProtoFactory::create_for(&desc, raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use protopath_reflect::{FieldSchema, MessageSchema, TypeRegistry};

    fn factory() -> ProtoFactory {
        let mut registry = TypeRegistry::new();
        registry
            .register_type(
                "Person",
                MessageSchema::new()
                    .field(FieldSchema::new("scores", 1, FieldKind::Int32).repeated())
                    .field(FieldSchema::message("friends", 2, "Person").repeated())
                    .field(FieldSchema::new("name", 3, FieldKind::String)),
            )
            .unwrap();
        registry.register_type("Other", MessageSchema::new()).unwrap();
        ProtoFactory::new(registry.build().unwrap())
    }

    fn argv<'a>(parts: &'a [&'a str]) -> Vec<&'a [u8]> {
        parts.iter().map(|p| p.as_bytes()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = AppendArgs::parse(&argv(&["PB.APPEND", "k", "Person", "scores", "1", "2"]))
            .unwrap();
        assert_eq!(args.key, b"k");
        assert_eq!(args.type_name, "Person");
        assert_eq!(args.path.to_string(), "scores");
        assert_eq!(args.elements, vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[test]
    fn test_parse_arity_and_path_errors() {
        assert_eq!(
            AppendArgs::parse(&argv(&["PB.APPEND", "k", "Person", "scores"])),
            Err(CommandError::WrongArity("PB.APPEND".into()))
        );
        assert_eq!(AppendArgs::parse(&[]), Err(CommandError::WrongArity(String::new())));
        assert!(matches!(
            AppendArgs::parse(&argv(&["PB.APPEND", "k", "Person", "scores[", "1"])),
            Err(CommandError::Path(_))
        ));
    }

    #[test]
    fn test_append_message_elements() {
        let factory = factory();
        let cmd = AppendCommand::new(&factory);
        let mut store = MemoryStore::new();
        let len = cmd
            .execute(
                &mut store,
                &argv(&["PB.APPEND", "k", "Person", "friends", r#"{"name":"bob"}"#, "{}"]),
            )
            .unwrap();
        assert_eq!(len, 2);

        assert!(matches!(
            cmd.execute(&mut store, &argv(&["PB.APPEND", "k", "Person", "friends", "{"])),
            Err(CommandError::Factory(FactoryError::Parse { .. }))
        ));
    }

    #[test]
    fn test_deeply_nested_message_element_is_rejected() {
        let factory = factory();
        let mut store = MemoryStore::new();
        // Person.friends (field 2) wrapped inside itself 5000 times.
        let mut token = Vec::new();
        for _ in 0..5000 {
            let mut frame = vec![0x12];
            let mut len = token.len();
            while len >= 0x80 {
                frame.push((len as u8) | 0x80);
                len >>= 7;
            }
            frame.push(len as u8);
            frame.extend_from_slice(&token);
            token = frame;
        }
        let argv: [&[u8]; 5] = [b"PB.APPEND", b"k", b"Person", b"friends", &token];
        assert!(matches!(
            AppendCommand::new(&factory).execute(&mut store, &argv),
            Err(CommandError::Factory(FactoryError::Parse {
                source: protopath_reflect::DecodeError::RecursionLimit,
                ..
            }))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_wrong_type() {
        let factory = factory();
        let cmd = AppendCommand::new(&factory);
        let mut store = MemoryStore::new();
        cmd.execute(&mut store, &argv(&["PB.APPEND", "k", "Person", "scores", "1"]))
            .unwrap();
        let err = cmd
            .execute(&mut store, &argv(&["PB.APPEND", "k", "Other", "scores", "1"]))
            .unwrap_err();
        assert!(matches!(err, CommandError::WrongType { .. }));
        assert!(err.reply_text().starts_with("WRONGTYPE "));
    }

    #[test]
    fn test_reply_text() {
        let err = CommandError::WrongArity("PB.APPEND".into());
        assert_eq!(
            err.reply_text(),
            "ERR wrong number of arguments for 'PB.APPEND' command"
        );
    }

    #[test]
    fn test_failed_create_installs_nothing() {
        let factory = factory();
        let cmd = AppendCommand::new(&factory);
        let mut store = MemoryStore::new();
        assert!(cmd
            .execute(&mut store, &argv(&["PB.APPEND", "k", "Person", "scores", "x"]))
            .is_err());
        assert!(cmd
            .execute(&mut store, &argv(&["PB.APPEND", "k", "Person", "name", "x"]))
            .is_err());
        assert!(store.is_empty());
    }
}
