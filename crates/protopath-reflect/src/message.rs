//! Dynamically typed message instances.

use thiserror::Error;

use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::kind::FieldKind;
use crate::value::Value;

/// Type errors raised by the reflective accessors of [`DynamicMessage`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("field {field} does not belong to message {message}")]
    ForeignField { field: String, message: String },
    #[error("field {field} is repeated")]
    Repeated { field: String },
    #[error("field {field} is not repeated")]
    NotRepeated { field: String },
    #[error("field {field} is not a message field")]
    NotMessage { field: String },
    #[error("field {field} has no element {index} (length {len})")]
    NoElement {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("field {field} expects {expected}, got {found}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },
    #[error("field {field} expects message {expected}, got {found}")]
    MessageTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
}

/// Storage for one declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Singular scalar, always present (defaults are materialized).
    Single(Value),
    /// Singular message, unset until written or traversed.
    Message(Option<Box<DynamicMessage>>),
    Repeated(Vec<Value>),
}

impl FieldValue {
    fn default_for(field: &FieldDescriptor) -> Self {
        if field.is_repeated() {
            return FieldValue::Repeated(Vec::new());
        }
        match field.default_value() {
            Some(value) => FieldValue::Single(value),
            None => FieldValue::Message(None),
        }
    }
}

/// A message whose shape is known only through its [`MessageDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: MessageDescriptor,
    fields: Vec<FieldValue>,
}

impl DynamicMessage {
    /// A message with every field at its default.
    pub fn new(descriptor: MessageDescriptor) -> Self {
        let fields = descriptor
            .fields()
            .map(|field| FieldValue::default_for(&field))
            .collect();
        Self { descriptor, fields }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Every field with its storage, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldDescriptor, &FieldValue)> + '_ {
        self.descriptor.fields().zip(self.fields.iter())
    }

    pub fn get(&self, field: &FieldDescriptor) -> Option<&FieldValue> {
        self.owns(field).then(|| &self.fields[field.index()])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&FieldValue> {
        let field = self.descriptor.get_field_by_name(name)?;
        self.get(&field)
    }

    /// `true` when the field differs from its default.
    pub fn has(&self, field: &FieldDescriptor) -> bool {
        match self.get(field) {
            Some(FieldValue::Single(value)) => field.default_value().as_ref() != Some(value),
            Some(FieldValue::Message(slot)) => slot.is_some(),
            Some(FieldValue::Repeated(values)) => !values.is_empty(),
            None => false,
        }
    }

    /// Reset a field to its default.
    pub fn clear(&mut self, field: &FieldDescriptor) -> Result<(), MessageError> {
        let index = self.slot_index(field)?;
        self.fields[index] = FieldValue::default_for(field);
        Ok(())
    }

    /// Replace the value of a singular field.
    pub fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MessageError> {
        let index = self.slot_index(field)?;
        if field.is_repeated() {
            return Err(MessageError::Repeated {
                field: field.name().to_string(),
            });
        }
        check_value(field, &value)?;
        match (&mut self.fields[index], value) {
            (FieldValue::Message(slot), Value::Message(msg)) => *slot = Some(msg),
            (slot, value) => *slot = FieldValue::Single(value),
        }
        Ok(())
    }

    /// Append to a repeated field, returning its new length.
    pub fn push(&mut self, field: &FieldDescriptor, value: Value) -> Result<usize, MessageError> {
        check_value(field, &value)?;
        let values = self.repeated_mut(field)?;
        values.push(value);
        Ok(values.len())
    }

    /// Replace one element of a repeated field.
    pub fn set_element(
        &mut self,
        field: &FieldDescriptor,
        index: usize,
        value: Value,
    ) -> Result<(), MessageError> {
        check_value(field, &value)?;
        let values = self.repeated_mut(field)?;
        let len = values.len();
        match values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MessageError::NoElement {
                field: field.name().to_string(),
                index,
                len,
            }),
        }
    }

    /// Elements of a repeated field.
    pub fn list(&self, field: &FieldDescriptor) -> Option<&[Value]> {
        match self.get(field)? {
            FieldValue::Repeated(values) => Some(values),
            _ => None,
        }
    }

    /// Singular message field, if set.
    pub fn get_message(&self, field: &FieldDescriptor) -> Option<&DynamicMessage> {
        match self.get(field)? {
            FieldValue::Message(slot) => slot.as_deref(),
            _ => None,
        }
    }

    /// Singular message field, created with defaults when unset.
    pub fn message_mut(
        &mut self,
        field: &FieldDescriptor,
    ) -> Result<&mut DynamicMessage, MessageError> {
        let index = self.slot_index(field)?;
        let not_message = || MessageError::NotMessage {
            field: field.name().to_string(),
        };
        let message_type = field.message_type().ok_or_else(not_message)?;
        match &mut self.fields[index] {
            FieldValue::Message(slot) => {
                Ok(&mut **slot.get_or_insert_with(|| Box::new(DynamicMessage::new(message_type))))
            }
            _ => Err(not_message()),
        }
    }

    /// One message element of a repeated message field.
    pub fn element_message_mut(
        &mut self,
        field: &FieldDescriptor,
        index: usize,
    ) -> Result<&mut DynamicMessage, MessageError> {
        if field.kind() != FieldKind::Message {
            return Err(MessageError::NotMessage {
                field: field.name().to_string(),
            });
        }
        let values = self.repeated_mut(field)?;
        let len = values.len();
        match values.get_mut(index) {
            Some(Value::Message(msg)) => Ok(&mut **msg),
            _ => Err(MessageError::NoElement {
                field: field.name().to_string(),
                index,
                len,
            }),
        }
    }

    fn owns(&self, field: &FieldDescriptor) -> bool {
        field.containing_message() == &self.descriptor
    }

    fn slot_index(&self, field: &FieldDescriptor) -> Result<usize, MessageError> {
        if !self.owns(field) {
            return Err(MessageError::ForeignField {
                field: field.name().to_string(),
                message: self.type_name().to_string(),
            });
        }
        Ok(field.index())
    }

    fn repeated_mut(&mut self, field: &FieldDescriptor) -> Result<&mut Vec<Value>, MessageError> {
        let index = self.slot_index(field)?;
        match &mut self.fields[index] {
            FieldValue::Repeated(values) => Ok(values),
            _ => Err(MessageError::NotRepeated {
                field: field.name().to_string(),
            }),
        }
    }
}

/// Check that `value` may be stored in `field`.
pub fn check_value(field: &FieldDescriptor, value: &Value) -> Result<(), MessageError> {
    if value.kind() != field.kind() {
        return Err(MessageError::KindMismatch {
            field: field.name().to_string(),
            expected: field.kind(),
            found: value.kind(),
        });
    }
    if let (Value::Message(msg), Some(expected)) = (value, field.message_type()) {
        if msg.descriptor() != &expected {
            return Err(MessageError::MessageTypeMismatch {
                field: field.name().to_string(),
                expected: expected.name().to_string(),
                found: msg.type_name().to_string(),
            });
        }
    }
    Ok(())
}
