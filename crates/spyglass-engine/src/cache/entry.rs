//! Collection entry descriptors
//!
//! An entry points back at its container weakly: whoever evaluated the
//! container owns it, and once that value is replaced (or the host drops the
//! container) the entry faults instead of keeping it alive.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use spyglass_sdk::{DictRef, Fault, ListRef, TypeId, TypeRegistry, Value};

use super::{CacheEntry, EvalState};
use crate::classify::ValueKind;
use crate::error::{EvalFault, WriteFault};

type WeakList = Weak<RwLock<Vec<Value>>>;
type WeakDict = Weak<RwLock<Vec<(Value, Value)>>>;

/// Weak handle to an evaluated list or dictionary
#[derive(Debug, Clone)]
pub(crate) enum Container {
    List(WeakList),
    Dict(WeakDict),
}

impl Container {
    /// Downgrade a `List` or `Dict` value
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(list) => Some(Container::List(Arc::downgrade(list))),
            Value::Dict(dict) => Some(Container::Dict(Arc::downgrade(dict))),
            _ => None,
        }
    }

    pub(crate) fn is_dictionary(&self) -> bool {
        matches!(self, Container::Dict(_))
    }

    /// Whether the container still exists
    pub(crate) fn is_attached(&self) -> bool {
        match self {
            Container::List(weak) => weak.strong_count() > 0,
            Container::Dict(weak) => weak.strong_count() > 0,
        }
    }

    /// Current length, zero once the container is gone
    pub(crate) fn len(&self) -> usize {
        match self {
            Container::List(weak) => weak.upgrade().map_or(0, |list| list.read().len()),
            Container::Dict(weak) => weak.upgrade().map_or(0, |dict| dict.read().len()),
        }
    }
}

/// Which part of the container an entry reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    /// List element at an index
    Element(usize),
    /// Value of the dictionary pair at an index
    DictValue(usize),
    /// Key of the dictionary pair at an index (read-only)
    DictKey(usize),
}

impl EntryRole {
    /// Position in the container
    pub fn index(self) -> usize {
        match self {
            EntryRole::Element(i) | EntryRole::DictValue(i) | EntryRole::DictKey(i) => i,
        }
    }
}

/// Descriptor for one element of an evaluated list or dictionary
pub struct CollectionEntry {
    registry: Arc<TypeRegistry>,
    container: Container,
    role: EntryRole,
    label: String,
    key: Option<Box<CollectionEntry>>,
    state: EvalState,
}

impl CollectionEntry {
    /// Entry for a list element
    pub fn element(registry: Arc<TypeRegistry>, list: &ListRef, index: usize) -> Self {
        Self {
            registry,
            container: Container::List(Arc::downgrade(list)),
            role: EntryRole::Element(index),
            label: format!("[{}]", index),
            key: None,
            state: EvalState::NotEvaluated,
        }
    }

    /// Entry for a dictionary pair; the key gets its own entry
    pub fn dict_entry(registry: Arc<TypeRegistry>, dict: &DictRef, index: usize) -> Self {
        let weak = Arc::downgrade(dict);
        let key = CollectionEntry {
            registry: Arc::clone(&registry),
            container: Container::Dict(weak.clone()),
            role: EntryRole::DictKey(index),
            label: format!("key {}", index),
            key: None,
            state: EvalState::NotEvaluated,
        };
        Self {
            registry,
            container: Container::Dict(weak),
            role: EntryRole::DictValue(index),
            label: format!("value {}", index),
            key: Some(Box::new(key)),
            state: EvalState::NotEvaluated,
        }
    }

    /// What the entry reads
    pub fn role(&self) -> EntryRole {
        self.role
    }

    /// Key entry of a dictionary pair
    pub fn key(&self) -> Option<&CollectionEntry> {
        self.key.as_deref()
    }

    /// Mutable key entry of a dictionary pair
    pub fn key_mut(&mut self) -> Option<&mut CollectionEntry> {
        self.key.as_deref_mut()
    }

    /// Whether the container still exists
    pub fn is_attached(&self) -> bool {
        self.container.is_attached()
    }

    fn read(&self) -> Result<Value, EvalFault> {
        let index = self.role.index();
        match (&self.container, self.role) {
            (Container::List(weak), _) => {
                let list = weak.upgrade().ok_or(EvalFault::ContainerGone)?;
                let items = list.read();
                items
                    .get(index)
                    .cloned()
                    .ok_or_else(|| Fault::index_out_of_range(index, items.len()).into())
            }
            (Container::Dict(weak), role) => {
                let dict = weak.upgrade().ok_or(EvalFault::ContainerGone)?;
                let pairs = dict.read();
                let (key, value) = pairs
                    .get(index)
                    .ok_or_else(|| EvalFault::from(Fault::index_out_of_range(index, pairs.len())))?;
                Ok(match role {
                    EntryRole::DictKey(_) => key.clone(),
                    _ => value.clone(),
                })
            }
        }
    }

    fn write(&self, value: Value) -> Result<(), WriteFault> {
        let index = self.role.index();
        match (&self.container, self.role) {
            (_, EntryRole::DictKey(_)) => Err(WriteFault::NotWritable(self.label.clone())),
            (Container::List(weak), _) => {
                let list = weak.upgrade().ok_or(WriteFault::ContainerGone)?;
                let mut items = list.write();
                let len = items.len();
                let slot = items
                    .get_mut(index)
                    .ok_or_else(|| Fault::index_out_of_range(index, len))?;
                *slot = value;
                Ok(())
            }
            (Container::Dict(weak), _) => {
                let dict = weak.upgrade().ok_or(WriteFault::ContainerGone)?;
                let mut pairs = dict.write();
                let len = pairs.len();
                let (_, slot) = pairs
                    .get_mut(index)
                    .ok_or_else(|| Fault::index_out_of_range(index, len))?;
                *slot = value;
                Ok(())
            }
        }
    }
}

impl CacheEntry for CollectionEntry {
    fn label(&self) -> &str {
        &self.label
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Entries have no declared type; the last value's runtime type stands in
    fn declared_type(&self) -> Option<TypeId> {
        self.state.value().and_then(Value::runtime_type)
    }

    fn state(&self) -> &EvalState {
        &self.state
    }

    fn evaluate(&mut self) -> ValueKind {
        self.state = EvalState::settle(self.read());
        if let Some(key) = self.key.as_deref_mut() {
            key.evaluate();
        }
        self.value_kind()
    }

    fn can_write(&self) -> bool {
        !matches!(self.role, EntryRole::DictKey(_))
    }

    fn set_value(&mut self, value: Value) -> Result<(), WriteFault> {
        self.write(value)?;
        self.evaluate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.state = EvalState::NotEvaluated;
        if let Some(key) = self.key.as_deref_mut() {
            key.invalidate();
        }
    }
}

impl fmt::Debug for CollectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionEntry")
            .field("role", &self.role)
            .field("attached", &self.is_attached())
            .field("state", &self.state)
            .finish()
    }
}
