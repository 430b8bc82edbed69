//! Object references
//!
//! A live object is exposed through one of two object models:
//!
//! - **Native**: a host object that stores its fields by name
//! - **Foreign**: a handle into an embedded runtime's heap whose fields are
//!   laid out positionally (see [`ForeignRuntime`])
//!
//! [`ObjectRef`] is the tagged union of the two. Code outside the engine's
//! adapter layer should only ever ask it representation-neutral questions
//! (type, identity, liveness).
//!
//! [`ForeignRuntime`]: crate::ForeignRuntime

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::foreign::ForeignRef;
use crate::registry::TypeRegistry;
use crate::types::TypeId;
use crate::value::Value;

/// Which object model backs a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Host object
    Native,
    /// Embedded-runtime wrapper
    Foreign,
}

/// One declaration of a field on a host object
#[derive(Debug, Clone)]
struct FieldSlot {
    declaring: TypeId,
    value: Value,
}

/// Host object with named field storage
///
/// Each field is stored under the type that declares it. A derived field with
/// the same name as a base field gets its own storage; unqualified access
/// ([`NativeObject::get`], [`NativeObject::set`]) reaches the most derived
/// declaration, and [`NativeObject::get_declared`] reaches a specific one.
pub struct NativeObject {
    ty: TypeId,
    /// Declarations per name, base first
    fields: RwLock<FxHashMap<String, Vec<FieldSlot>>>,
    destroyed: AtomicBool,
}

impl NativeObject {
    /// Create an object with no field storage
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            fields: RwLock::new(FxHashMap::default()),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Create an object with every instance field of `ty` and its ancestors
    /// set to the field's default value
    pub fn instantiate(registry: &TypeRegistry, ty: TypeId) -> Self {
        let obj = Self::new(ty);
        {
            let mut fields = obj.fields.write();
            let chain: Vec<TypeId> = registry.ancestors(ty).collect();
            for id in chain.into_iter().rev() {
                if let Some(def) = registry.get(id) {
                    for field in def.instance_fields() {
                        fields.entry(field.name.clone()).or_default().push(FieldSlot {
                            declaring: id,
                            value: field.default_value.clone(),
                        });
                    }
                }
            }
        }
        obj
    }

    /// Set a field (builder style)
    ///
    /// Overwrites the most derived declaration of `name`. A name with no
    /// declaration is stored on the root type, where every type can see it.
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        {
            let mut fields = self.fields.write();
            let slots = fields.entry(name.into()).or_default();
            match slots.last_mut() {
                Some(slot) => slot.value = value.into(),
                None => slots.push(FieldSlot {
                    declaring: TypeId::OBJECT,
                    value: value.into(),
                }),
            }
        }
        self
    }

    /// Runtime type
    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    /// Read the most derived declaration of a field
    pub fn get(&self, name: &str) -> Option<Value> {
        let fields = self.fields.read();
        fields.get(name)?.last().map(|slot| slot.value.clone())
    }

    /// Write the most derived declaration of a field, returning whether it
    /// existed
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.fields.write().get_mut(name).and_then(|s| s.last_mut()) {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }

    /// Read the field `name` as declared by `declaring`
    pub fn get_declared(&self, declaring: TypeId, name: &str) -> Option<Value> {
        let fields = self.fields.read();
        fields
            .get(name)?
            .iter()
            .find(|slot| slot.declaring == declaring)
            .map(|slot| slot.value.clone())
    }

    /// Write the field `name` as declared by `declaring`, returning whether
    /// that declaration exists
    pub fn set_declared(&self, declaring: TypeId, name: &str, value: Value) -> bool {
        let mut fields = self.fields.write();
        let slot = fields
            .get_mut(name)
            .and_then(|slots| slots.iter_mut().find(|slot| slot.declaring == declaring));
        match slot {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }

    /// Whether `declaring` has a stored field called `name`
    pub fn has_declared(&self, declaring: TypeId, name: &str) -> bool {
        self.fields
            .read()
            .get(name)
            .is_some_and(|slots| slots.iter().any(|slot| slot.declaring == declaring))
    }

    /// Whether a field exists
    pub fn has_field(&self, name: &str) -> bool {
        self.fields
            .read()
            .get(name)
            .is_some_and(|slots| !slots.is_empty())
    }

    /// Number of stored field declarations
    pub fn field_count(&self) -> usize {
        self.fields.read().values().map(Vec::len).sum()
    }

    /// Mark the object as destroyed
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
    }

    /// Whether the object has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObject")
            .field("ty", &self.ty)
            .field("fields", &self.field_count())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Reference to a live object in either representation
#[derive(Clone)]
pub enum ObjectRef {
    /// Host object
    Native(Arc<NativeObject>),
    /// Embedded-runtime handle
    Foreign(ForeignRef),
}

impl ObjectRef {
    /// Wrap a host object
    pub fn native(obj: NativeObject) -> Self {
        ObjectRef::Native(Arc::new(obj))
    }

    /// Runtime type of the referenced object
    pub fn type_id(&self) -> TypeId {
        match self {
            ObjectRef::Native(obj) => obj.type_id(),
            ObjectRef::Foreign(obj) => obj.type_id(),
        }
    }

    /// Which object model backs this reference
    pub fn representation(&self) -> Representation {
        match self {
            ObjectRef::Native(_) => Representation::Native,
            ObjectRef::Foreign(_) => Representation::Foreign,
        }
    }

    /// Whether the referenced object can still be accessed
    pub fn is_alive(&self) -> bool {
        match self {
            ObjectRef::Native(obj) => !obj.is_destroyed(),
            ObjectRef::Foreign(obj) => obj.is_alive(),
        }
    }

    /// Stable identity for the lifetime of the object
    pub fn identity(&self) -> usize {
        match self {
            ObjectRef::Native(obj) => Arc::as_ptr(obj) as usize,
            ObjectRef::Foreign(obj) => obj.identity(),
        }
    }

    /// Whether two references point at the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        match (self, other) {
            (ObjectRef::Native(a), ObjectRef::Native(b)) => Arc::ptr_eq(a, b),
            (ObjectRef::Foreign(a), ObjectRef::Foreign(b)) => a.same_object(b),
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Native(obj) => write!(f, "Native({:?})", obj),
            ObjectRef::Foreign(obj) => write!(f, "Foreign({:?})", obj),
        }
    }
}
