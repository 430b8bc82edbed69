//! Member definitions
//!
//! Fields are plain storage. Properties and methods carry their bodies as
//! shared closures written against [`Receiver`], which is the only view of
//! the live object a body gets. This keeps member bodies independent of how
//! the object is actually stored (host object or embedded-runtime handle).

use std::fmt;
use std::sync::Arc;

use crate::error::FaultResult;
use crate::types::TypeId;
use crate::value::Value;

/// Neutral view of the object a member body runs against
pub trait Receiver {
    /// Read a field by name
    fn field(&self, name: &str) -> FaultResult<Value>;

    /// Write a field by name
    fn set_field(&self, name: &str, value: Value) -> FaultResult<()>;

    /// Whether the body runs without an instance
    fn is_static(&self) -> bool;
}

/// Property getter: receiver + index arguments
pub type GetterFn = Arc<dyn Fn(&dyn Receiver, &[Value]) -> FaultResult<Value> + Send + Sync>;

/// Property setter: receiver + index arguments + new value
pub type SetterFn = Arc<dyn Fn(&dyn Receiver, &[Value], Value) -> FaultResult<()> + Send + Sync>;

/// Method body: receiver + arguments
pub type InvokeFn = Arc<dyn Fn(&dyn Receiver, &[Value]) -> FaultResult<Value> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to derived types
    Protected,
    /// Visible to the declaring type only
    Private,
}

impl Visibility {
    /// Whether the member is public
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// A method or indexer parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeId,
}

impl ParameterDef {
    /// Create a parameter
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeId,
    /// Whether the field is static
    pub is_static: bool,
    /// Whether the field is readonly
    pub is_readonly: bool,
    /// Visibility
    pub visibility: Visibility,
    /// Value a fresh instance (or the static slot) starts with
    pub default_value: Value,
}

impl FieldDef {
    /// Create a public instance field
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            is_readonly: false,
            visibility: Visibility::Public,
            default_value: Value::Null,
        }
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as readonly
    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    /// Set the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Set the initial value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }
}

/// Property definition
#[derive(Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Property type
    pub ty: TypeId,
    /// Whether the property is static
    pub is_static: bool,
    /// Whether this overrides a base property of the same name
    pub is_override: bool,
    /// Visibility
    pub visibility: Visibility,
    /// Index parameters (non-empty for indexers)
    pub index_params: Vec<ParameterDef>,
    /// Getter body
    pub getter: Option<GetterFn>,
    /// Setter body
    pub setter: Option<SetterFn>,
}

impl PropertyDef {
    /// Create a public instance property with no accessors
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            is_override: false,
            visibility: Visibility::Public,
            index_params: Vec::new(),
            getter: None,
            setter: None,
        }
    }

    /// Set the getter
    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Receiver, &[Value]) -> FaultResult<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(f));
        self
    }

    /// Set the setter
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Receiver, &[Value], Value) -> FaultResult<()> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(f));
        self
    }

    /// Add an index parameter
    pub fn indexed(mut self, param: ParameterDef) -> Self {
        self.index_params.push(param);
        self
    }

    /// Mark as static property
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as overriding a base property
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Set the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("is_static", &self.is_static)
            .field("is_override", &self.is_override)
            .field("visibility", &self.visibility)
            .field("index_params", &self.index_params)
            .field("has_getter", &self.getter.is_some())
            .field("has_setter", &self.setter.is_some())
            .finish()
    }
}

/// Method definition
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Return type ([`TypeId::VOID`] for none)
    pub return_type: TypeId,
    /// Parameters
    pub params: Vec<ParameterDef>,
    /// Whether the method is static
    pub is_static: bool,
    /// Whether this overrides a base method with the same signature
    pub is_override: bool,
    /// Visibility
    pub visibility: Visibility,
    /// Method body
    pub body: InvokeFn,
}

impl MethodDef {
    /// Create a public instance method
    pub fn new<F>(name: impl Into<String>, return_type: TypeId, body: F) -> Self
    where
        F: Fn(&dyn Receiver, &[Value]) -> FaultResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            is_static: false,
            is_override: false,
            visibility: Visibility::Public,
            body: Arc::new(body),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, param: ParameterDef) -> Self {
        self.params.push(param);
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as overriding a base method
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Set the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("params", &self.params)
            .field("is_static", &self.is_static)
            .field("is_override", &self.is_override)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}
