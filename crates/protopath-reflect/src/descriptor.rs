//! Frozen message descriptors.
//!
//! A [`DescriptorPool`] is the immutable result of [`crate::TypeRegistry::build`].
//! [`MessageDescriptor`] and [`FieldDescriptor`] are cheap handles (pool plus
//! index) into it, so they can be cloned freely and compared by identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::kind::FieldKind;
use crate::value::Value;

#[derive(Debug)]
pub(crate) struct PoolInner {
    pub(crate) messages: IndexMap<String, MessageInfo>,
}

#[derive(Debug)]
pub(crate) struct MessageInfo {
    pub(crate) name: String,
    pub(crate) fields: IndexMap<String, FieldInfo>,
    pub(crate) by_number: HashMap<u32, usize>,
}

#[derive(Debug)]
pub(crate) struct FieldInfo {
    pub(crate) name: String,
    pub(crate) number: u32,
    pub(crate) kind: FieldKind,
    pub(crate) repeated: bool,
    /// Pool index of the field's message type.
    pub(crate) message_type: Option<usize>,
    pub(crate) default: Option<Value>,
}

/// Every registered message type, shared read-only.
#[derive(Clone)]
pub struct DescriptorPool {
    inner: Arc<PoolInner>,
}

impl DescriptorPool {
    pub(crate) fn new(inner: PoolInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn get_message(&self, name: &str) -> Option<MessageDescriptor> {
        self.inner
            .messages
            .get_index_of(name)
            .map(|index| MessageDescriptor {
                pool: self.clone(),
                index,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.messages.contains_key(name)
    }

    /// Registered types in registration order.
    pub fn messages(&self) -> impl ExactSizeIterator<Item = MessageDescriptor> + '_ {
        (0..self.inner.messages.len()).map(move |index| MessageDescriptor {
            pool: self.clone(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.messages.is_empty()
    }
}

impl PartialEq for DescriptorPool {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for DescriptorPool {}

impl fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inner.messages.keys())
            .finish()
    }
}

/// Handle to one message type.
#[derive(Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pool: DescriptorPool,
    index: usize,
}

impl MessageDescriptor {
    pub(crate) fn info(&self) -> &MessageInfo {
        &self.pool.inner.messages[self.index]
    }

    /// Registered type name.
    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn field_count(&self) -> usize {
        self.info().fields.len()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDescriptor> + '_ {
        (0..self.field_count()).map(move |index| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    pub fn get_field(&self, index: usize) -> Option<FieldDescriptor> {
        (index < self.field_count()).then(|| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    pub fn get_field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        self.info()
            .fields
            .get_index_of(name)
            .map(|index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }

    pub fn get_field_by_number(&self, number: u32) -> Option<FieldDescriptor> {
        self.info()
            .by_number
            .get(&number)
            .map(|&index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageDescriptor({})", self.name())
    }
}

/// Handle to one field of a message type.
#[derive(Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    message: MessageDescriptor,
    index: usize,
}

impl FieldDescriptor {
    fn info(&self) -> &FieldInfo {
        &self.message.info().fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn number(&self) -> u32 {
        self.info().number
    }

    pub fn kind(&self) -> FieldKind {
        self.info().kind
    }

    pub fn is_repeated(&self) -> bool {
        self.info().repeated
    }

    /// Position of the field in its message's declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn containing_message(&self) -> &MessageDescriptor {
        &self.message
    }

    /// Declared type of a message field.
    pub fn message_type(&self) -> Option<MessageDescriptor> {
        self.info().message_type.map(|index| MessageDescriptor {
            pool: self.message.pool.clone(),
            index,
        })
    }

    /// Value of an unset singular scalar: the declared default, else zero.
    ///
    /// `None` for message fields, which default to unset.
    pub fn default_value(&self) -> Option<Value> {
        let info = self.info();
        match &info.default {
            Some(value) => Some(value.clone()),
            None => Value::zero(info.kind),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldDescriptor({}.{})", self.message.name(), self.name())
    }
}
