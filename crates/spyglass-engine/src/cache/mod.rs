//! Member cache
//!
//! The cache is the array of [`MemberDescriptor`]s built once per session by
//! [`MemberCacheBuilder`], plus [`CollectionEntry`] descriptors created on
//! demand for the elements of evaluated collections. Both implement
//! [`CacheEntry`], which is all the paging layer and consumers need.

mod builder;
mod entry;
mod member;
mod state;

pub use builder::MemberCacheBuilder;
pub(crate) use entry::Container;
pub use entry::{CollectionEntry, EntryRole};
pub use member::MemberDescriptor;
pub use state::EvalState;

use spyglass_sdk::{TypeId, TypeRegistry, Value};

use crate::classify::{classify, ValueKind};
use crate::error::{ParseError, WriteFault};
use crate::parse::parse_value;

/// Something that holds an evaluation state and can be (re)evaluated
pub trait CacheEntry {
    /// Display label (member signature or entry index/key)
    fn label(&self) -> &str;

    /// Registry used to resolve types
    fn registry(&self) -> &TypeRegistry;

    /// Type values are classified and parsed against
    fn declared_type(&self) -> Option<TypeId>;

    /// Current evaluation state
    fn state(&self) -> &EvalState;

    /// Read the current value; never fails, faults are captured into the state
    fn evaluate(&mut self) -> ValueKind;

    /// Whether [`CacheEntry::set_value`] can succeed
    fn can_write(&self) -> bool;

    /// Write a value, then re-read it
    ///
    /// On failure the previous state is left as it was.
    fn set_value(&mut self, value: Value) -> Result<(), WriteFault>;

    /// Forget the last evaluation
    fn invalidate(&mut self);

    /// Whether the entry may be evaluated without being asked to
    fn auto_evaluates(&self) -> bool {
        true
    }

    /// Classification of the current state
    fn value_kind(&self) -> ValueKind {
        let declared = self.declared_type().and_then(|ty| self.registry().get(ty));
        classify(self.state(), declared)
    }

    /// Parse `text` against the declared type and write it
    fn set_value_text(&mut self, text: &str) -> Result<(), WriteFault> {
        let ty = self
            .declared_type()
            .ok_or_else(|| ParseError::Unsupported(self.label().to_string()))?;
        let value = parse_value(text, ty, self.registry())?;
        self.set_value(value)
    }
}
