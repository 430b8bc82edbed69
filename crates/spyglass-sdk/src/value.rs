//! The neutral value type
//!
//! Every value the engine reads from or writes to a live object passes
//! through this enum, whichever object model produced it.
//!
//! # Sharing
//!
//! - Primitives, strings, enums and structs are owned copies
//! - Lists and dictionaries are shared (`Arc<RwLock<..>>`), so an element
//!   written through one handle is visible through every other handle to
//!   the same container
//! - Objects are references (see [`ObjectRef`])

use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::ObjectRef;
use crate::types::TypeId;

/// Shared, mutable sequence
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable, insertion-ordered key/value pairs
pub type DictRef = Arc<RwLock<Vec<(Value, Value)>>>;

/// Enum value: the enum type plus the underlying integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    /// Enum type
    pub ty: TypeId,
    /// Underlying integer
    pub discriminant: i64,
}

/// Struct value: copied field values in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    /// Struct type
    pub ty: TypeId,
    /// Field values
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    /// Create an empty struct value
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Read a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Overwrite an existing field, returning whether it existed
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// A value read from or written to a live object
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point
    Float(f64),
    /// Character
    Char(char),
    /// String
    Str(Arc<str>),
    /// Enum constant
    Enum(EnumValue),
    /// Struct copy
    Struct(StructValue),
    /// Shared sequence
    List(ListRef),
    /// Shared dictionary
    Dict(DictRef),
    /// Object reference
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Create a new shared list
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    /// Create a new shared dictionary
    pub fn dict(entries: Vec<(Value, Value)>) -> Self {
        Value::Dict(Arc::new(RwLock::new(entries)))
    }

    /// Create an enum value
    pub fn enumeration(ty: TypeId, discriminant: i64) -> Self {
        Value::Enum(EnumValue { ty, discriminant })
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this is `Null` or a reference to a destroyed object
    pub fn is_null_or_destroyed(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Object(obj) => !obj.is_alive(),
            _ => false,
        }
    }

    /// Whether this is an integer or float
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_) | Value::Float(_))
    }

    /// Whether this is a signed or unsigned integer
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_))
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as signed integer (unsigned values that fit are converted)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Get as float (integers are widened)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short description of the value's shape
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
            Value::Object(_) => "object",
        }
    }

    /// Registered type of the value, when it has one
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            Value::Null | Value::List(_) | Value::Dict(_) => None,
            Value::Bool(_) => Some(TypeId::BOOL),
            Value::Int(_) => Some(TypeId::INT),
            Value::UInt(_) => Some(TypeId::UINT),
            Value::Float(_) => Some(TypeId::FLOAT),
            Value::Char(_) => Some(TypeId::CHAR),
            Value::Str(_) => Some(TypeId::STRING),
            Value::Enum(e) => Some(e.ty),
            Value::Struct(s) => Some(s.ty),
            Value::Object(obj) => Some(obj.type_id()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            // Containers and objects compare by identity
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
