//! Type definitions
//!
//! A [`TypeDef`] is the reflection metadata a host publishes for one type:
//! its kind, its base type, and the fields, properties and methods it
//! declares itself. Inherited members are not copied into derived types;
//! the engine walks the base chain to find them.

use std::fmt;

use crate::member::{FieldDef, MethodDef, PropertyDef};

/// Identifier of a registered type (index into the [`TypeRegistry`])
///
/// [`TypeRegistry`]: crate::TypeRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Root of every hierarchy
    pub const OBJECT: TypeId = TypeId(0);
    /// Return type of methods that produce nothing
    pub const VOID: TypeId = TypeId(1);
    /// Boolean primitive
    pub const BOOL: TypeId = TypeId(2);
    /// Signed integer primitive
    pub const INT: TypeId = TypeId(3);
    /// Unsigned integer primitive
    pub const UINT: TypeId = TypeId(4);
    /// Floating point primitive
    pub const FLOAT: TypeId = TypeId(5);
    /// Character primitive
    pub const CHAR: TypeId = TypeId(6);
    /// String
    pub const STRING: TypeId = TypeId(7);

    /// Placeholder id carried by a definition until it is registered
    pub(crate) const UNREGISTERED: TypeId = TypeId(u32::MAX);

    /// Index of this id in the registry
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `bool`
    Bool,
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    UInt,
    /// 64-bit float
    Float,
    /// Unicode scalar
    Char,
}

impl Primitive {
    /// Name used for the builtin type
    pub fn type_name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Float => "float",
            Primitive::Char => "char",
        }
    }
}

/// One named constant of an enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    /// Variant name
    pub name: String,
    /// Underlying integer value
    pub discriminant: i64,
}

/// What sort of type a definition describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Reference type with identity
    Class,
    /// Value type copied on read
    Struct,
    /// Named integer constants
    Enum(Vec<EnumVariant>),
    /// Builtin primitive
    Primitive(Primitive),
    /// Builtin string
    String,
    /// Builtin void
    Void,
}

impl TypeKind {
    /// Whether values of this kind are copied rather than referenced
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeKind::Struct | TypeKind::Enum(_) | TypeKind::Primitive(_)
        )
    }
}

/// Reflection metadata for one type
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Registry id (assigned on registration)
    pub id: TypeId,
    /// Type name
    pub name: String,
    /// Type kind
    pub kind: TypeKind,
    /// Base type (`None` only for the root)
    pub parent: Option<TypeId>,
    /// Fields declared by this type
    pub fields: Vec<FieldDef>,
    /// Properties declared by this type
    pub properties: Vec<PropertyDef>,
    /// Methods declared by this type
    pub methods: Vec<MethodDef>,
    /// Set when the type's metadata failed to load
    pub load_error: Option<String>,
}

impl TypeDef {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            id: TypeId::UNREGISTERED,
            name: name.into(),
            kind,
            parent: None,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            load_error: None,
        }
    }

    /// Define a class
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    /// Define a struct
    pub fn structure(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Struct)
    }

    /// Define an enum from `(name, discriminant)` pairs
    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = (S, i64)>,
    ) -> Self {
        let variants = variants
            .into_iter()
            .map(|(name, discriminant)| EnumVariant {
                name: name.into(),
                discriminant,
            })
            .collect();
        Self::with_kind(name, TypeKind::Enum(variants))
    }

    pub(crate) fn builtin(name: &str, kind: TypeKind) -> Self {
        Self::with_kind(name, kind)
    }

    /// Set the base type
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a field
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a property
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Mark the metadata as failed to load
    pub fn with_load_error(mut self, reason: impl Into<String>) -> Self {
        self.load_error = Some(reason.into());
        self
    }

    /// Whether members can be enumerated for this type
    pub fn is_reflectable(&self) -> bool {
        self.load_error.is_none()
    }

    /// Enum variants (empty for non-enum types)
    pub fn variants(&self) -> &[EnumVariant] {
        match &self.kind {
            TypeKind::Enum(variants) => variants,
            _ => &[],
        }
    }

    /// Name of the variant with the given discriminant
    pub fn variant_name(&self, discriminant: i64) -> Option<&str> {
        self.variants()
            .iter()
            .find(|v| v.discriminant == discriminant)
            .map(|v| v.name.as_str())
    }

    /// Whether this is an enum type
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    /// Whether this is a primitive or the string type
    pub fn is_primitive_or_string(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_) | TypeKind::String)
    }

    /// Instance field definitions
    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.is_static)
    }
}
