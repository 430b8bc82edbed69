//! Type registry
//!
//! Owns every [`TypeDef`] a host publishes, assigns ids, and stores the
//! values of static fields. The builtin types (object root, void and the
//! primitives) are registered up front with fixed ids, see [`TypeId`].

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::types::{Primitive, TypeDef, TypeId, TypeKind};
use crate::value::Value;

/// Registry of reflectable types
#[derive(Debug)]
pub struct TypeRegistry {
    /// Types indexed by id
    types: Vec<TypeDef>,
    /// Type name to id mapping
    name_to_id: FxHashMap<String, TypeId>,
    /// Static field storage: (declaring type, field name) -> value
    statics: RwLock<FxHashMap<(TypeId, String), Value>>,
}

impl TypeRegistry {
    /// Create a registry holding only the builtin types
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            name_to_id: FxHashMap::default(),
            statics: RwLock::new(FxHashMap::default()),
        };

        let builtins = [
            ("object", TypeKind::Class),
            ("void", TypeKind::Void),
            ("bool", TypeKind::Primitive(Primitive::Bool)),
            ("int", TypeKind::Primitive(Primitive::Int)),
            ("uint", TypeKind::Primitive(Primitive::UInt)),
            ("float", TypeKind::Primitive(Primitive::Float)),
            ("char", TypeKind::Primitive(Primitive::Char)),
            ("string", TypeKind::String),
        ];
        for (name, kind) in builtins {
            registry.register(TypeDef::builtin(name, kind));
        }

        registry
    }

    /// Register a type and return its id
    ///
    /// Types without an explicit base derive from the object root.
    pub fn register(&mut self, mut def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        def.id = id;
        if def.parent.is_none() && id != TypeId::OBJECT {
            def.parent = Some(TypeId::OBJECT);
        }

        {
            let mut statics = self.statics.write();
            for field in def.fields.iter().filter(|f| f.is_static) {
                statics.insert((id, field.name.clone()), field.default_value.clone());
            }
        }

        self.name_to_id.insert(def.name.clone(), id);
        self.types.push(def);
        id
    }

    /// Get a type by id
    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.index())
    }

    /// Get a type by name
    pub fn by_name(&self, name: &str) -> Option<&TypeDef> {
        self.name_to_id.get(name).and_then(|id| self.get(*id))
    }

    /// Id of a named type
    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Name of a type, or `"<unknown>"`
    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("<unknown>")
    }

    /// Number of registered types (builtins included)
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all types
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    /// The type followed by each registered ancestor, most derived first
    ///
    /// Stops at the first unregistered id and never yields more items than
    /// there are registered types, so a malformed cycle cannot loop forever.
    pub fn ancestors(&self, id: TypeId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: self.get(id).map(|t| t.id),
            remaining: self.types.len(),
        }
    }

    /// Check if `sub` is `sup` or derives from it
    pub fn is_subclass_of(&self, sub: TypeId, sup: TypeId) -> bool {
        self.ancestors(sub).any(|id| id == sup)
    }

    /// Whether `id` names a primitive or the string type
    pub fn is_primitive_or_string(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(TypeDef::is_primitive_or_string)
    }

    /// Read a static field value
    pub fn static_value(&self, ty: TypeId, name: &str) -> Option<Value> {
        self.statics.read().get(&(ty, name.to_string())).cloned()
    }

    /// Write a static field value, returning whether the slot existed
    pub fn set_static_value(&self, ty: TypeId, name: &str, value: Value) -> bool {
        match self.statics.write().get_mut(&(ty, name.to_string())) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a type and its ancestors
pub struct Ancestors<'a> {
    registry: &'a TypeRegistry,
    next: Option<TypeId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self
            .registry
            .get(current)
            .and_then(|t| t.parent)
            .filter(|p| self.registry.get(*p).is_some());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::FieldDef;

    #[test]
    fn test_builtins_have_fixed_ids() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.id_of("object"), Some(TypeId::OBJECT));
        assert_eq!(registry.id_of("string"), Some(TypeId::STRING));
        assert_eq!(registry.name_of(TypeId::FLOAT), "float");
        assert!(registry.get(TypeId::OBJECT).unwrap().parent.is_none());
        assert!(registry.is_primitive_or_string(TypeId::CHAR));
        assert!(!registry.is_primitive_or_string(TypeId::OBJECT));
    }

    #[test]
    fn test_register_defaults_parent_to_object() {
        let mut registry = TypeRegistry::new();
        let id = registry.register(TypeDef::class("Foo"));
        assert_eq!(registry.get(id).unwrap().parent, Some(TypeId::OBJECT));
        assert_eq!(registry.by_name("Foo").unwrap().id, id);
    }

    #[test]
    fn test_ancestors_and_subclass() {
        // Animal -> Dog -> Labrador
        let mut registry = TypeRegistry::new();
        let animal = registry.register(TypeDef::class("Animal"));
        let dog = registry.register(TypeDef::class("Dog").extends(animal));
        let lab = registry.register(TypeDef::class("Labrador").extends(dog));

        let chain: Vec<TypeId> = registry.ancestors(lab).collect();
        assert_eq!(chain, vec![lab, dog, animal, TypeId::OBJECT]);
        assert!(registry.is_subclass_of(lab, animal));
        assert!(registry.is_subclass_of(dog, dog));
        assert!(!registry.is_subclass_of(animal, dog));
    }

    #[test]
    fn test_ancestors_stop_at_unregistered_parent() {
        let mut registry = TypeRegistry::new();
        let orphan = registry.register(TypeDef::class("Orphan").extends(TypeId(999)));
        let chain: Vec<TypeId> = registry.ancestors(orphan).collect();
        assert_eq!(chain, vec![orphan]);
        assert_eq!(registry.ancestors(TypeId(999)).count(), 0);
    }

    #[test]
    fn test_static_storage() {
        let mut registry = TypeRegistry::new();
        let id = registry.register(
            TypeDef::class("Settings").with_field(
                FieldDef::new("volume", TypeId::FLOAT)
                    .as_static()
                    .with_default(0.5),
            ),
        );
        assert_eq!(registry.static_value(id, "volume"), Some(Value::Float(0.5)));
        assert!(registry.set_static_value(id, "volume", Value::Float(1.0)));
        assert!(!registry.set_static_value(id, "missing", Value::Null));
        assert_eq!(registry.static_value(id, "volume"), Some(Value::Float(1.0)));
    }
}
