//! Embedded-runtime object model
//!
//! Objects owned by an embedded runtime are not host objects: the host only
//! holds a generation-checked handle into the runtime's heap, and fields are
//! addressed by slot index through a per-class layout. A class layout exists
//! only for types a wrapper has been generated for ([`ForeignRuntime::bind_class`]);
//! accessing an object as a type without a layout is an invalid cast.
//!
//! Freed handles stay valid as values but no longer reach an object. They are
//! what the engine treats as the destroyed-handle sentinel.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{Fault, FaultResult};
use crate::registry::TypeRegistry;
use crate::types::TypeId;
use crate::value::Value;

/// Field layout of one class as the embedded runtime sees it
///
/// A field hidden by a derived declaration of the same name keeps its own
/// slot. Lookup by name alone finds the most derived one.
#[derive(Debug, Clone)]
pub struct ForeignClass {
    /// Runtime class id
    pub class_id: u32,
    /// Registered type this layout wraps
    pub type_id: TypeId,
    /// Field name to most derived slot index
    field_indices: FxHashMap<String, usize>,
    /// Field names in slot order
    field_names: Vec<String>,
    /// Declaring type of each slot
    declared_by: Vec<TypeId>,
}

impl ForeignClass {
    fn new(class_id: u32, type_id: TypeId) -> Self {
        Self {
            class_id,
            type_id,
            field_indices: FxHashMap::default(),
            field_names: Vec::new(),
            declared_by: Vec::new(),
        }
    }

    /// Add a field slot for `declaring`, returning its index (a field already
    /// declared by the same type keeps its slot)
    pub fn add_field(&mut self, declaring: TypeId, name: &str) -> usize {
        if let Some(index) = self.declared_field_index(declaring, name) {
            return index;
        }
        let index = self.field_names.len();
        self.field_indices.insert(name.to_string(), index);
        self.field_names.push(name.to_string());
        self.declared_by.push(declaring);
        index
    }

    /// Get the most derived slot index by field name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// Get the slot index of `name` as declared by `declaring`
    pub fn declared_field_index(&self, declaring: TypeId, name: &str) -> Option<usize> {
        self.field_names
            .iter()
            .zip(&self.declared_by)
            .position(|(field, ty)| *ty == declaring && field == name)
    }

    /// Field names in slot order
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of slots
    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }
}

/// Generation-checked heap handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignHandle {
    slot: u32,
    generation: u32,
}

#[derive(Debug)]
struct HeapObject {
    class_id: u32,
    fields: Vec<Value>,
}

#[derive(Debug, Default)]
struct HeapSlot {
    generation: u32,
    object: Option<HeapObject>,
}

#[derive(Debug, Default)]
struct Heap {
    slots: Vec<HeapSlot>,
    free: Vec<u32>,
}

#[derive(Debug, Default)]
struct ClassTable {
    classes: Vec<ForeignClass>,
    by_type: FxHashMap<TypeId, u32>,
}

/// Heap and class table of an embedded runtime
#[derive(Debug, Default)]
pub struct ForeignRuntime {
    classes: RwLock<ClassTable>,
    heap: RwLock<Heap>,
}

impl ForeignRuntime {
    /// Create an empty runtime
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Generate a wrapper layout for `ty`: one slot per instance field of the
    /// type and its ancestors, base fields first
    pub fn bind_class(&self, registry: &TypeRegistry, ty: TypeId) -> u32 {
        let mut table = self.classes.write();
        if let Some(id) = table.by_type.get(&ty) {
            return *id;
        }

        let class_id = table.classes.len() as u32;
        let mut class = ForeignClass::new(class_id, ty);
        let chain: Vec<TypeId> = registry.ancestors(ty).collect();
        for id in chain.into_iter().rev() {
            if let Some(def) = registry.get(id) {
                for field in def.instance_fields() {
                    class.add_field(id, &field.name);
                }
            }
        }

        table.classes.push(class);
        table.by_type.insert(ty, class_id);
        class_id
    }

    /// Layout generated for `ty`, if any
    pub fn class_for(&self, ty: TypeId) -> Option<ForeignClass> {
        let table = self.classes.read();
        table
            .by_type
            .get(&ty)
            .and_then(|id| table.classes.get(*id as usize))
            .cloned()
    }

    /// Allocate an instance of `ty` with every slot at its field default
    pub fn alloc(self: &Arc<Self>, registry: &TypeRegistry, ty: TypeId) -> FaultResult<ForeignRef> {
        let class = self.class_for(ty).ok_or_else(|| {
            Fault::invalid_operation(format!(
                "no wrapper generated for {}",
                registry.name_of(ty)
            ))
        })?;

        let mut fields = vec![Value::Null; class.field_count()];
        let chain: Vec<TypeId> = registry.ancestors(ty).collect();
        for id in chain.into_iter().rev() {
            if let Some(def) = registry.get(id) {
                for field in def.instance_fields() {
                    if let Some(index) = class.declared_field_index(id, &field.name) {
                        fields[index] = field.default_value.clone();
                    }
                }
            }
        }

        let object = HeapObject {
            class_id: class.class_id,
            fields,
        };

        let mut heap = self.heap.write();
        let handle = match heap.free.pop() {
            Some(slot) => {
                let entry = &mut heap.slots[slot as usize];
                entry.object = Some(object);
                ForeignHandle {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                let slot = heap.slots.len() as u32;
                heap.slots.push(HeapSlot {
                    generation: 0,
                    object: Some(object),
                });
                ForeignHandle { slot, generation: 0 }
            }
        };

        Ok(ForeignRef {
            runtime: Arc::clone(self),
            handle,
            ty,
        })
    }

    /// Free an object; returns false if the handle was already stale
    pub fn free(&self, handle: ForeignHandle) -> bool {
        let mut heap = self.heap.write();
        let Some(entry) = heap.slots.get_mut(handle.slot as usize) else {
            return false;
        };
        if entry.generation != handle.generation || entry.object.is_none() {
            return false;
        }
        entry.object = None;
        entry.generation = entry.generation.wrapping_add(1);
        heap.free.push(handle.slot);
        true
    }

    /// Whether the handle still reaches an object
    pub fn is_alive(&self, handle: ForeignHandle) -> bool {
        let heap = self.heap.read();
        heap.slots
            .get(handle.slot as usize)
            .is_some_and(|e| e.generation == handle.generation && e.object.is_some())
    }

    /// Number of live objects
    pub fn live_objects(&self) -> usize {
        let heap = self.heap.read();
        heap.slots.iter().filter(|e| e.object.is_some()).count()
    }

    /// Read a field slot
    pub fn read_slot(&self, handle: ForeignHandle, index: usize) -> FaultResult<Value> {
        let heap = self.heap.read();
        let object = Self::resolve(&heap, handle)?;
        object
            .fields
            .get(index)
            .cloned()
            .ok_or_else(|| Fault::index_out_of_range(index, object.fields.len()))
    }

    /// Write a field slot
    pub fn write_slot(&self, handle: ForeignHandle, index: usize, value: Value) -> FaultResult<()> {
        let mut heap = self.heap.write();
        let object = Self::resolve_mut(&mut heap, handle)?;
        let len = object.fields.len();
        let slot = object
            .fields
            .get_mut(index)
            .ok_or_else(|| Fault::index_out_of_range(index, len))?;
        *slot = value;
        Ok(())
    }

    /// Runtime class id of a live object
    pub fn class_of(&self, handle: ForeignHandle) -> FaultResult<u32> {
        let heap = self.heap.read();
        Self::resolve(&heap, handle).map(|o| o.class_id)
    }

    fn resolve(heap: &Heap, handle: ForeignHandle) -> FaultResult<&HeapObject> {
        heap.slots
            .get(handle.slot as usize)
            .filter(|e| e.generation == handle.generation)
            .and_then(|e| e.object.as_ref())
            .ok_or_else(Self::freed)
    }

    fn resolve_mut(heap: &mut Heap, handle: ForeignHandle) -> FaultResult<&mut HeapObject> {
        heap.slots
            .get_mut(handle.slot as usize)
            .filter(|e| e.generation == handle.generation)
            .and_then(|e| e.object.as_mut())
            .ok_or_else(Self::freed)
    }

    fn freed() -> Fault {
        Fault::null_reference("the wrapped object has been freed by its runtime")
    }
}

/// Host-side wrapper around a heap handle
#[derive(Clone)]
pub struct ForeignRef {
    runtime: Arc<ForeignRuntime>,
    handle: ForeignHandle,
    ty: TypeId,
}

impl ForeignRef {
    /// Owning runtime
    pub fn runtime(&self) -> &Arc<ForeignRuntime> {
        &self.runtime
    }

    /// Heap handle
    pub fn handle(&self) -> ForeignHandle {
        self.handle
    }

    /// Runtime type
    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    /// Whether the handle still reaches an object
    pub fn is_alive(&self) -> bool {
        self.runtime.is_alive(self.handle)
    }

    /// Free the object in its runtime
    pub fn free(&self) -> bool {
        self.runtime.free(self.handle)
    }

    /// Identity derived from runtime and slot
    pub fn identity(&self) -> usize {
        let base = Arc::as_ptr(&self.runtime) as usize;
        base ^ ((self.handle.slot as usize) << 16) ^ self.handle.generation as usize
    }

    /// Whether both wrappers reach the same heap object
    pub fn same_object(&self, other: &ForeignRef) -> bool {
        Arc::ptr_eq(&self.runtime, &other.runtime) && self.handle == other.handle
    }
}

impl fmt::Debug for ForeignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignRef")
            .field("handle", &self.handle)
            .field("ty", &self.ty)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::FieldDef;
    use crate::types::TypeDef;

    fn registry() -> (TypeRegistry, TypeId, TypeId) {
        let mut registry = TypeRegistry::new();
        let base = registry.register(
            TypeDef::class("Component")
                .with_field(FieldDef::new("enabled", TypeId::BOOL).with_default(true)),
        );
        let light = registry.register(
            TypeDef::class("Light")
                .extends(base)
                .with_field(FieldDef::new("range", TypeId::FLOAT).with_default(10.0)),
        );
        (registry, base, light)
    }

    #[test]
    fn test_bind_class_lays_out_base_fields_first() {
        let (registry, _, light) = registry();
        let runtime = ForeignRuntime::new();
        runtime.bind_class(&registry, light);

        let class = runtime.class_for(light).unwrap();
        assert_eq!(class.field_names(), &["enabled".to_string(), "range".to_string()]);
        assert_eq!(class.field_index("range"), Some(1));
    }

    #[test]
    fn test_hidden_field_gets_its_own_slot() {
        let mut registry = TypeRegistry::new();
        let base = registry.register(
            TypeDef::class("Base").with_field(FieldDef::new("hp", TypeId::INT).with_default(1)),
        );
        let derived = registry.register(
            TypeDef::class("Derived")
                .extends(base)
                .with_field(FieldDef::new("hp", TypeId::INT).with_default(2)),
        );
        let runtime = ForeignRuntime::new();
        runtime.bind_class(&registry, base);
        runtime.bind_class(&registry, derived);

        let base_class = runtime.class_for(base).unwrap();
        assert_eq!(base_class.type_id, base);
        assert_eq!(base_class.field_index("hp"), Some(0));

        let class = runtime.class_for(derived).unwrap();
        assert_eq!(class.type_id, derived);
        assert_eq!(class.field_count(), 2);
        assert_eq!(class.field_index("hp"), Some(1));
        assert_eq!(class.declared_field_index(base, "hp"), Some(0));
        assert_eq!(class.declared_field_index(derived, "hp"), Some(1));

        let obj = runtime.alloc(&registry, derived).unwrap();
        assert_eq!(runtime.read_slot(obj.handle(), 0).unwrap(), Value::Int(1));
        assert_eq!(runtime.read_slot(obj.handle(), 1).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_alloc_requires_bound_class() {
        let (registry, base, light) = registry();
        let runtime = ForeignRuntime::new();
        runtime.bind_class(&registry, light);

        assert!(runtime.alloc(&registry, base).is_err());
        let obj = runtime.alloc(&registry, light).unwrap();
        assert_eq!(runtime.read_slot(obj.handle(), 1).unwrap(), Value::Float(10.0));
    }

    #[test]
    fn test_freed_handle_is_stale_after_reuse() {
        let (registry, _, light) = registry();
        let runtime = ForeignRuntime::new();
        runtime.bind_class(&registry, light);

        let first = runtime.alloc(&registry, light).unwrap();
        assert!(first.free());
        assert!(!first.is_alive());
        assert!(!first.free());

        let second = runtime.alloc(&registry, light).unwrap();
        assert!(second.is_alive());
        assert!(!first.is_alive());
        assert!(!first.same_object(&second));

        let err = runtime.read_slot(first.handle(), 0).unwrap_err();
        assert_eq!(err.kind, "NullReferenceException");
    }

    #[test]
    fn test_write_slot_bounds() {
        let (registry, _, light) = registry();
        let runtime = ForeignRuntime::new();
        runtime.bind_class(&registry, light);
        let obj = runtime.alloc(&registry, light).unwrap();

        runtime.write_slot(obj.handle(), 0, Value::Bool(false)).unwrap();
        assert_eq!(runtime.read_slot(obj.handle(), 0).unwrap(), Value::Bool(false));
        assert!(runtime.write_slot(obj.handle(), 5, Value::Null).is_err());
    }
}
