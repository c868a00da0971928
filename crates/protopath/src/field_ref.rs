//! Path resolution against a live message.
//!
//! [`FieldRef::resolve`] walks a [`Path`] through a [`DynamicMessage`] and
//! returns a handle in one of three states:
//!
//! - the root message (empty path),
//! - a whole field, possibly repeated (`scores`, `address.city`),
//! - one element of a repeated field (`scores[1]`).
//!
//! Appending is only allowed on a whole repeated field. Reading and replacing
//! a single value is allowed on singular fields and on elements.

use protopath_path::{Path, Segment};
use protopath_reflect::{
    check_value, DynamicMessage, FieldDescriptor, FieldKind, FieldValue, MessageDescriptor,
    MessageError, Value,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldRefError {
    #[error("no field {name} in message {message}")]
    FieldNotFound { name: String, message: String },
    #[error("{field} is not a message")]
    NotMessage { field: String },
    #[error("{field} is not an array")]
    NotArray { field: String },
    #[error("index {index} out of range for {field} (length {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

impl From<MessageError> for FieldRefError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::KindMismatch {
                expected, found, ..
            } => FieldRefError::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            MessageError::MessageTypeMismatch {
                expected, found, ..
            } => FieldRefError::TypeMismatch { expected, found },
            MessageError::NotMessage { field } => FieldRefError::NotMessage { field },
            MessageError::NotRepeated { field } => FieldRefError::NotArray { field },
            MessageError::NoElement { field, index, len } => {
                FieldRefError::IndexOutOfRange { field, index, len }
            }
            MessageError::Repeated { .. } => {
                FieldRefError::InvalidOperation("field is repeated")
            }
            MessageError::ForeignField { field, message } => FieldRefError::FieldNotFound {
                name: field,
                message,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Root,
    Field(FieldDescriptor),
    Element(FieldDescriptor, usize),
}

/// A resolved location inside a borrowed message.
///
/// Holds the message that directly contains the addressed field, so every
/// operation is a single lookup.
#[derive(Debug)]
pub struct FieldRef<'m> {
    msg: &'m mut DynamicMessage,
    target: Target,
}

impl<'m> FieldRef<'m> {
    /// Resolve `path` against `msg`.
    ///
    /// The path is checked against `msg` first. Unset singular message
    /// fields on the way are only created with defaults once the whole path
    /// is known to resolve.
    pub fn resolve(msg: &'m mut DynamicMessage, path: &Path) -> Result<Self, FieldRefError> {
        Location::locate(msg, path)?.bind(msg)
    }

    /// Kind of the addressed value. The root is a message.
    pub fn kind(&self) -> FieldKind {
        match &self.target {
            Target::Root => FieldKind::Message,
            Target::Field(field) | Target::Element(field, _) => field.kind(),
        }
    }

    /// `true` for a whole repeated field and for one of its elements.
    pub fn is_array(&self) -> bool {
        match &self.target {
            Target::Root => false,
            Target::Field(field) => field.is_repeated(),
            Target::Element(..) => true,
        }
    }

    pub fn is_array_element(&self) -> bool {
        matches!(self.target, Target::Element(..))
    }

    /// The addressed field, `None` at the root.
    pub fn field(&self) -> Option<&FieldDescriptor> {
        match &self.target {
            Target::Root => None,
            Target::Field(field) | Target::Element(field, _) => Some(field),
        }
    }

    /// Element index of an element reference.
    pub fn index(&self) -> Option<usize> {
        match self.target {
            Target::Element(_, index) => Some(index),
            _ => None,
        }
    }

    /// Declared message type of the addressed value, if it is a message.
    pub fn msg_type(&self) -> Option<MessageDescriptor> {
        match &self.target {
            Target::Root => Some(self.msg.descriptor().clone()),
            Target::Field(field) | Target::Element(field, _) => field.message_type(),
        }
    }

    pub fn array_size(&self) -> Result<usize, FieldRefError> {
        let field = self.whole_array()?;
        Ok(self.msg.list(field).map_or(0, <[Value]>::len))
    }

    /// Append `value` to the referenced repeated field, returning the new length.
    pub fn add(&mut self, value: Value) -> Result<usize, FieldRefError> {
        let field = self.whole_array()?.clone();
        check_value(&field, &value)?;
        Ok(self.msg.push(&field, value)?)
    }

    pub fn add_int32(&mut self, value: i32) -> Result<usize, FieldRefError> {
        self.add(Value::Int32(value))
    }

    pub fn add_int64(&mut self, value: i64) -> Result<usize, FieldRefError> {
        self.add(Value::Int64(value))
    }

    pub fn add_uint32(&mut self, value: u32) -> Result<usize, FieldRefError> {
        self.add(Value::Uint32(value))
    }

    pub fn add_uint64(&mut self, value: u64) -> Result<usize, FieldRefError> {
        self.add(Value::Uint64(value))
    }

    pub fn add_double(&mut self, value: f64) -> Result<usize, FieldRefError> {
        self.add(Value::Double(value))
    }

    pub fn add_float(&mut self, value: f32) -> Result<usize, FieldRefError> {
        self.add(Value::Float(value))
    }

    pub fn add_bool(&mut self, value: bool) -> Result<usize, FieldRefError> {
        self.add(Value::Bool(value))
    }

    pub fn add_string(&mut self, value: impl Into<String>) -> Result<usize, FieldRefError> {
        self.add(Value::String(value.into()))
    }

    pub fn add_bytes(&mut self, value: impl Into<Vec<u8>>) -> Result<usize, FieldRefError> {
        self.add(Value::Bytes(value.into()))
    }

    pub fn add_msg(&mut self, value: DynamicMessage) -> Result<usize, FieldRefError> {
        self.add(Value::from(value))
    }

    /// Copy of the addressed singular value or element.
    pub fn value(&self) -> Result<Value, FieldRefError> {
        match &self.target {
            Target::Root => Err(FieldRefError::InvalidOperation("cannot read the root as a value")),
            Target::Field(field) => match self.msg.get(field) {
                Some(FieldValue::Single(value)) => Ok(value.clone()),
                Some(FieldValue::Message(Some(sub))) => Ok(Value::Message(sub.clone())),
                Some(FieldValue::Message(None)) => {
                    let desc = field
                        .message_type()
                        .ok_or(FieldRefError::InvalidOperation("field has no message type"))?;
                    Ok(Value::from(DynamicMessage::new(desc)))
                }
                _ => Err(FieldRefError::InvalidOperation(
                    "cannot read a whole array as a value",
                )),
            },
            Target::Element(field, index) => self
                .msg
                .list(field)
                .and_then(|values| values.get(*index))
                .cloned()
                .ok_or_else(|| FieldRefError::IndexOutOfRange {
                    field: field.name().to_string(),
                    index: *index,
                    len: self.msg.list(field).map_or(0, <[Value]>::len),
                }),
        }
    }

    /// Replace the addressed singular value or element.
    pub fn set(&mut self, value: Value) -> Result<(), FieldRefError> {
        match &self.target {
            Target::Root => Err(FieldRefError::InvalidOperation("cannot replace the root")),
            Target::Field(field) if field.is_repeated() => Err(FieldRefError::InvalidOperation(
                "cannot replace a whole array",
            )),
            Target::Field(field) => Ok(self.msg.set(field, value)?),
            Target::Element(field, index) => Ok(self.msg.set_element(field, *index, value)?),
        }
    }

    /// The message that contains the addressed field (the root message for
    /// an empty path).
    pub fn message(&self) -> &DynamicMessage {
        &*self.msg
    }

    fn whole_array(&self) -> Result<&FieldDescriptor, FieldRefError> {
        match &self.target {
            Target::Field(field) if field.is_repeated() => Ok(field),
            Target::Element(..) => Err(FieldRefError::InvalidOperation(
                "operation needs the whole array, not one element",
            )),
            _ => Err(FieldRefError::InvalidOperation("not an array")),
        }
    }
}

/// A path checked against a message without changing it.
///
/// Binding a location to the message it was located in cannot fail on the
/// path itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    hops: Vec<Target>,
    target: Target,
}

impl Location {
    /// Check `path` against `msg`.
    ///
    /// Reports the same errors as [`FieldRef::resolve`]. Unset singular
    /// messages are read as empty.
    pub fn locate(msg: &DynamicMessage, path: &Path) -> Result<Self, FieldRefError> {
        let mut hops = Vec::new();
        let mut desc = msg.descriptor().clone();
        let mut current = Some(msg);
        let mut target = Target::Root;
        for segment in path {
            match segment {
                Segment::Field(name) => {
                    (desc, current) = peek(&desc, current, &target)?;
                    hops.push(target);
                    let field = desc.get_field_by_name(name).ok_or_else(|| {
                        FieldRefError::FieldNotFound {
                            name: name.clone(),
                            message: desc.name().to_string(),
                        }
                    })?;
                    target = Target::Field(field);
                }
                Segment::Index(index) => {
                    let field = match target {
                        Target::Field(field) if field.is_repeated() => field,
                        Target::Field(field) => {
                            return Err(FieldRefError::NotArray {
                                field: field.name().to_string(),
                            })
                        }
                        _ => {
                            return Err(FieldRefError::NotArray {
                                field: path.to_string(),
                            })
                        }
                    };
                    let len = current
                        .and_then(|m| m.list(&field))
                        .map_or(0, <[Value]>::len);
                    if *index >= len {
                        return Err(FieldRefError::IndexOutOfRange {
                            field: field.name().to_string(),
                            index: *index,
                            len,
                        });
                    }
                    target = Target::Element(field, *index);
                }
            }
        }
        Ok(Self { hops, target })
    }

    /// `true` when the path ends at a whole repeated field or one of its
    /// elements.
    pub fn is_array(&self) -> bool {
        match &self.target {
            Target::Root => false,
            Target::Field(field) => field.is_repeated(),
            Target::Element(..) => true,
        }
    }

    pub fn is_array_element(&self) -> bool {
        matches!(self.target, Target::Element(..))
    }

    /// The field the path ends at, `None` for the root.
    pub fn field(&self) -> Option<&FieldDescriptor> {
        match &self.target {
            Target::Root => None,
            Target::Field(field) | Target::Element(field, _) => Some(field),
        }
    }

    /// Walk `msg` along the located path, creating unset singular messages.
    pub fn bind(self, msg: &mut DynamicMessage) -> Result<FieldRef<'_>, FieldRefError> {
        let mut current = msg;
        for hop in &self.hops {
            current = descend(current, hop)?;
        }
        Ok(FieldRef {
            msg: current,
            target: self.target,
        })
    }
}

/// Type and contents of the message addressed by `target`, without creating
/// it. `None` contents stand for an unset message.
fn peek<'a>(
    desc: &MessageDescriptor,
    msg: Option<&'a DynamicMessage>,
    target: &Target,
) -> Result<(MessageDescriptor, Option<&'a DynamicMessage>), FieldRefError> {
    let (field, sub) = match target {
        Target::Root => return Ok((desc.clone(), msg)),
        Target::Field(field) if field.kind() == FieldKind::Message && !field.is_repeated() => {
            (field, msg.and_then(|m| m.get_message(field)))
        }
        Target::Element(field, index) if field.kind() == FieldKind::Message => (
            field,
            msg.and_then(|m| m.list(field))
                .and_then(|values| values.get(*index))
                .and_then(Value::as_message),
        ),
        Target::Field(field) | Target::Element(field, _) => {
            return Err(FieldRefError::NotMessage {
                field: field.name().to_string(),
            })
        }
    };
    let sub_desc = field.message_type().ok_or_else(|| FieldRefError::NotMessage {
        field: field.name().to_string(),
    })?;
    Ok((sub_desc, sub))
}

/// Step into the message addressed by `target`.
fn descend<'m>(
    msg: &'m mut DynamicMessage,
    target: &Target,
) -> Result<&'m mut DynamicMessage, FieldRefError> {
    match target {
        Target::Root => Ok(msg),
        Target::Field(field) if field.kind() == FieldKind::Message && !field.is_repeated() => {
            Ok(msg.message_mut(field)?)
        }
        Target::Element(field, index) if field.kind() == FieldKind::Message => {
            Ok(msg.element_message_mut(field, *index)?)
        }
        Target::Field(field) | Target::Element(field, _) => Err(FieldRefError::NotMessage {
            field: field.name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protopath_reflect::{FieldSchema, MessageSchema, ProtoFactory, TypeRegistry};

    fn factory() -> ProtoFactory {
        let mut registry = TypeRegistry::new();
        registry
            .register_type(
                "Person",
                MessageSchema::new()
                    .field(FieldSchema::new("name", 1, FieldKind::String))
                    .field(FieldSchema::new("scores", 2, FieldKind::Int32).repeated())
                    .field(FieldSchema::message("address", 3, "Address"))
                    .field(FieldSchema::message("friends", 4, "Person").repeated()),
            )
            .unwrap();
        registry
            .register_type(
                "Address",
                MessageSchema::new()
                    .field(FieldSchema::new("city", 1, FieldKind::String))
                    .field(FieldSchema::new("lines", 2, FieldKind::String).repeated()),
            )
            .unwrap();
        ProtoFactory::new(registry.build().unwrap())
    }

    fn path(text: &str) -> Path {
        Path::parse(text).unwrap()
    }

    #[test]
    fn test_resolve_states() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();

        let root = FieldRef::resolve(&mut msg, &Path::root()).unwrap();
        assert_eq!(root.kind(), FieldKind::Message);
        assert!(!root.is_array());
        assert_eq!(root.msg_type().unwrap().name(), "Person");

        let scores = FieldRef::resolve(&mut msg, &path("scores")).unwrap();
        assert_eq!(scores.kind(), FieldKind::Int32);
        assert!(scores.is_array());
        assert!(!scores.is_array_element());
        assert_eq!(scores.array_size(), Ok(0));

        let name = FieldRef::resolve(&mut msg, &path("name")).unwrap();
        assert!(!name.is_array());
        assert!(name.msg_type().is_none());
    }

    #[test]
    fn test_add_typed() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        let mut scores = FieldRef::resolve(&mut msg, &path("scores")).unwrap();
        assert_eq!(scores.add_int32(10), Ok(1));
        assert_eq!(scores.add(Value::Int32(20)), Ok(2));
        assert_eq!(
            scores.add_string("x"),
            Err(FieldRefError::TypeMismatch {
                expected: "int32".into(),
                found: "string".into()
            })
        );
        assert_eq!(scores.array_size(), Ok(2));
    }

    #[test]
    fn test_element_ref() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        {
            let mut scores = FieldRef::resolve(&mut msg, &path("scores")).unwrap();
            scores.add_int32(1).unwrap();
            scores.add_int32(2).unwrap();
        }
        let mut second = FieldRef::resolve(&mut msg, &path("scores[1]")).unwrap();
        assert!(second.is_array());
        assert!(second.is_array_element());
        assert_eq!(second.index(), Some(1));
        assert_eq!(second.value(), Ok(Value::Int32(2)));
        assert_eq!(
            second.add_int32(3),
            Err(FieldRefError::InvalidOperation(
                "operation needs the whole array, not one element"
            ))
        );
        assert!(matches!(
            second.array_size(),
            Err(FieldRefError::InvalidOperation(_))
        ));
        second.set(Value::Int32(7)).unwrap();
        assert_eq!(second.value(), Ok(Value::Int32(7)));
    }

    #[test]
    fn test_nested_message_is_created() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        let mut lines = FieldRef::resolve(&mut msg, &path("address.lines")).unwrap();
        assert_eq!(lines.add_string("a"), Ok(1));
        assert_eq!(lines.message().type_name(), "Address");

        let mut city = FieldRef::resolve(&mut msg, &path("address.city")).unwrap();
        city.set(Value::from("Oslo")).unwrap();
        assert_eq!(city.value(), Ok(Value::from("Oslo")));

        let address = msg.descriptor().get_field_by_name("address").unwrap();
        assert!(msg.has(&address));
    }

    #[test]
    fn test_through_repeated_message() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        let friend = factory.create("Person").unwrap();
        {
            let mut friends = FieldRef::resolve(&mut msg, &path("friends")).unwrap();
            assert_eq!(friends.msg_type().unwrap().name(), "Person");
            friends.add_msg(friend).unwrap();
            assert!(matches!(
                friends.add_msg(factory.create("Address").unwrap()),
                Err(FieldRefError::TypeMismatch { .. })
            ));
        }
        let mut nested = FieldRef::resolve(&mut msg, &path("friends[0].scores")).unwrap();
        assert_eq!(nested.add_int32(5), Ok(1));
    }

    #[test]
    fn test_resolve_errors() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        assert_eq!(
            FieldRef::resolve(&mut msg, &path("nope")).unwrap_err(),
            FieldRefError::FieldNotFound {
                name: "nope".into(),
                message: "Person".into()
            }
        );
        assert_eq!(
            FieldRef::resolve(&mut msg, &path("name.first")).unwrap_err(),
            FieldRefError::NotMessage {
                field: "name".into()
            }
        );
        assert_eq!(
            FieldRef::resolve(&mut msg, &path("friends.name")).unwrap_err(),
            FieldRefError::NotMessage {
                field: "friends".into()
            }
        );
        assert_eq!(
            FieldRef::resolve(&mut msg, &path("name[0]")).unwrap_err(),
            FieldRefError::NotArray {
                field: "name".into()
            }
        );
        assert_eq!(
            FieldRef::resolve(&mut msg, &path("scores[0]")).unwrap_err(),
            FieldRefError::IndexOutOfRange {
                field: "scores".into(),
                index: 0,
                len: 0
            }
        );
    }

    #[test]
    fn test_failed_resolve_leaves_message_unchanged() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        let before = msg.clone();
        for text in ["address.nope", "address.city[0]", "address.city.x", "address.lines[0]"] {
            assert!(FieldRef::resolve(&mut msg, &path(text)).is_err(), "{text}");
        }
        assert_eq!(msg, before);
        let address = msg.descriptor().get_field_by_name("address").unwrap();
        assert!(!msg.has(&address));
    }

    #[test]
    fn test_locate_does_not_create_submessages() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        let location = Location::locate(&msg, &path("address.lines")).unwrap();
        assert!(location.is_array());
        assert!(!location.is_array_element());
        assert_eq!(location.field().unwrap().name(), "lines");
        assert_eq!(msg, factory.create("Person").unwrap());

        let mut lines = location.bind(&mut msg).unwrap();
        assert_eq!(lines.add_string("a"), Ok(1));
        assert_eq!(
            Location::locate(&msg, &path("address.lines[1]")).unwrap_err(),
            FieldRefError::IndexOutOfRange {
                field: "lines".into(),
                index: 1,
                len: 1
            }
        );
    }

    #[test]
    fn test_element_error_reports_length() {
        assert_eq!(
            FieldRefError::from(MessageError::NoElement {
                field: "scores".into(),
                index: 4,
                len: 2
            }),
            FieldRefError::IndexOutOfRange {
                field: "scores".into(),
                index: 4,
                len: 2
            }
        );
    }

    #[test]
    fn test_value_and_set_on_whole_array() {
        let factory = factory();
        let mut msg = factory.create("Person").unwrap();
        let mut scores = FieldRef::resolve(&mut msg, &path("scores")).unwrap();
        assert!(matches!(
            scores.value(),
            Err(FieldRefError::InvalidOperation(_))
        ));
        assert!(matches!(
            scores.set(Value::Int32(1)),
            Err(FieldRefError::InvalidOperation(_))
        ));
        let mut root = FieldRef::resolve(&mut msg, &Path::root()).unwrap();
        assert!(matches!(root.add_int32(1), Err(FieldRefError::InvalidOperation(_))));
        assert!(matches!(root.set(Value::Int32(1)), Err(FieldRefError::InvalidOperation(_))));
    }
}
