//! Spyglass SDK - reflectable object model
//!
//! This crate provides the types a host (or an embedded runtime bridge) needs
//! to describe its objects to the spyglass inspector without depending on
//! the engine itself:
//!
//! - [`TypeRegistry`] / [`TypeDef`]: reflection metadata, including member
//!   bodies for properties and methods
//! - [`Value`]: the neutral value type every read and write goes through
//! - [`ObjectRef`]: a live object in one of two representations, a host
//!   [`NativeObject`] or a handle into a [`ForeignRuntime`]
//! - [`Fault`]: the exception value member bodies raise
//!
//! # Example
//!
//! ```ignore
//! use spyglass_sdk::{FieldDef, NativeObject, ObjectRef, TypeDef, TypeId, TypeRegistry, Value};
//!
//! let mut registry = TypeRegistry::new();
//! let point = registry.register(
//!     TypeDef::class("Point")
//!         .with_field(FieldDef::new("x", TypeId::INT))
//!         .with_field(FieldDef::new("y", TypeId::INT)),
//! );
//!
//! let obj = NativeObject::instantiate(&registry, point).with_field("x", 5);
//! let value = Value::Object(ObjectRef::native(obj));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod foreign;
pub mod member;
pub mod object;
pub mod registry;
pub mod types;
pub mod value;

pub use error::{Fault, FaultResult};
pub use foreign::{ForeignClass, ForeignHandle, ForeignRef, ForeignRuntime};
pub use member::{
    FieldDef, GetterFn, InvokeFn, MethodDef, ParameterDef, PropertyDef, Receiver, SetterFn,
    Visibility,
};
pub use object::{NativeObject, ObjectRef, Representation};
pub use registry::{Ancestors, TypeRegistry};
pub use types::{EnumVariant, Primitive, TypeDef, TypeId, TypeKind};
pub use value::{DictRef, EnumValue, ListRef, StructValue, Value};
