//! Keyed message storage used by the append command.

use std::collections::HashMap;

use protopath_reflect::DynamicMessage;

/// The host's key space as seen by a command.
///
/// A command mutates an existing message in place or installs a newly
/// created one.
pub trait MessageStore {
    fn get_mut(&mut self, key: &[u8]) -> Option<&mut DynamicMessage>;

    fn insert(&mut self, key: Vec<u8>, msg: DynamicMessage);
}

/// In-process store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<Vec<u8>, DynamicMessage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&DynamicMessage> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<DynamicMessage> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageStore for MemoryStore {
    fn get_mut(&mut self, key: &[u8]) -> Option<&mut DynamicMessage> {
        self.entries.get_mut(key)
    }

    fn insert(&mut self, key: Vec<u8>, msg: DynamicMessage) {
        self.entries.insert(key, msg);
    }
}
