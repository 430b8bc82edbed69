//! Object representation adapters
//!
//! A target is either a host object or a wrapper around an embedded
//! runtime's object. The two store their fields in incompatible ways, so
//! every member read and write goes through an [`ObjectAdapter`]: it casts
//! the target to the member's declaring type once, then hands member bodies
//! a [`Receiver`] over the result. Nothing outside this module looks at the
//! representation tag; [`adapter_for`] is the only place that does.

mod foreign;
mod native;

use std::fmt;
use std::sync::Arc;

use spyglass_sdk::{
    Fault, FaultResult, ForeignClass, ForeignRef, NativeObject, Receiver, Representation, TypeId,
    TypeKind, TypeRegistry, Value,
};

use crate::error::{AdaptError, EvalFault, WriteFault};
use crate::reflect::Member;
use crate::target::TargetHandle;

pub use foreign::ForeignAdapter;
pub use native::NativeAdapter;

// ============================================================================
// Adapter trait
// ============================================================================

/// Bridges a target to its declaring types
pub trait ObjectAdapter: Send + Sync {
    /// Object model this adapter handles
    fn representation(&self) -> Representation;

    /// Registry the adapter resolves types against
    fn registry(&self) -> &Arc<TypeRegistry>;

    /// Cast `target` to `declaring`
    ///
    /// Static targets always adapt; their members never touch an instance.
    fn adapt(&self, target: &TargetHandle, declaring: TypeId) -> Result<AdaptedHandle, AdaptError>;

    /// Instance view over a handle produced by [`ObjectAdapter::adapt`]
    fn instance_receiver<'a>(
        &'a self,
        handle: &'a AdaptedHandle,
    ) -> Result<Box<dyn Receiver + 'a>, AdaptError>;

    /// Read a member through an adapted handle
    fn get_value(
        &self,
        handle: &AdaptedHandle,
        member: &Member,
        args: &[Value],
    ) -> Result<Value, EvalFault> {
        let registry = self.registry();
        let statics;
        let instance;
        let receiver: &dyn Receiver = if member.is_static() || handle.is_static() {
            statics = StaticReceiver::new(registry, handle.declaring());
            &statics
        } else {
            instance = self.instance_receiver(handle)?;
            &*instance
        };

        let value = match member {
            Member::Field(field) => receiver.field(&field.name)?,
            Member::Property(property) => match &property.getter {
                Some(getter) => getter(receiver, args)?,
                None => {
                    return Err(Fault::invalid_operation(format!(
                        "property {} has no getter",
                        property.name
                    ))
                    .into())
                }
            },
            Member::Method(method) => (method.body)(receiver, args)?,
            Member::Setter { property, .. } => {
                let Some((value, index)) = args.split_last() else {
                    return Err(EvalFault::MissingArguments {
                        expected: 1,
                        supplied: 0,
                    });
                };
                match &property.setter {
                    Some(setter) => setter(receiver, index, value.clone())?,
                    None => {
                        return Err(Fault::invalid_operation(format!(
                            "property {} has no setter",
                            property.name
                        ))
                        .into())
                    }
                }
                Value::Null
            }
        };

        Ok(normalize(registry, member.value_type(), value))
    }

    /// Write a member through an adapted handle
    fn set_value(
        &self,
        handle: &AdaptedHandle,
        member: &Member,
        index: &[Value],
        value: Value,
    ) -> Result<(), WriteFault> {
        if !member.can_write() {
            return Err(WriteFault::NotWritable(member.name().to_string()));
        }

        let registry = self.registry();
        let statics;
        let instance;
        let receiver: &dyn Receiver = if member.is_static() || handle.is_static() {
            statics = StaticReceiver::new(registry, handle.declaring());
            &statics
        } else {
            instance = self.instance_receiver(handle)?;
            &*instance
        };

        match member {
            Member::Field(field) => receiver.set_field(&field.name, value)?,
            Member::Property(property) => match &property.setter {
                Some(setter) => setter(receiver, index, value)?,
                None => return Err(WriteFault::NotWritable(property.name.clone())),
            },
            Member::Method(_) | Member::Setter { .. } => {
                return Err(WriteFault::NotWritable(member.name().to_string()))
            }
        }
        Ok(())
    }
}

/// Pick the adapter for a target's representation
pub fn adapter_for(registry: &Arc<TypeRegistry>, target: &TargetHandle) -> Arc<dyn ObjectAdapter> {
    match target.representation() {
        Representation::Native => Arc::new(NativeAdapter::new(Arc::clone(registry))),
        Representation::Foreign => Arc::new(ForeignAdapter::new(Arc::clone(registry))),
    }
}

// ============================================================================
// Adapted handles
// ============================================================================

/// A target cast to one declaring type
#[derive(Clone)]
pub enum AdaptedHandle {
    /// No instance; static members only
    Static {
        /// Declaring type
        declaring: TypeId,
    },
    /// Host object
    Native {
        /// Declaring type
        declaring: TypeId,
        /// The object
        object: Arc<NativeObject>,
    },
    /// Embedded-runtime object viewed through the declaring type's wrapper
    Foreign {
        /// Declaring type
        declaring: TypeId,
        /// The object
        object: ForeignRef,
        /// Wrapper layout of the declaring type
        class: ForeignClass,
    },
}

impl AdaptedHandle {
    /// Declaring type the target was cast to
    pub fn declaring(&self) -> TypeId {
        match self {
            AdaptedHandle::Static { declaring }
            | AdaptedHandle::Native { declaring, .. }
            | AdaptedHandle::Foreign { declaring, .. } => *declaring,
        }
    }

    /// Whether there is no instance behind the handle
    pub fn is_static(&self) -> bool {
        matches!(self, AdaptedHandle::Static { .. })
    }
}

impl fmt::Debug for AdaptedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdaptedHandle::Static { declaring } => write!(f, "Static({})", declaring),
            AdaptedHandle::Native { declaring, .. } => write!(f, "Native({})", declaring),
            AdaptedHandle::Foreign {
                declaring, class, ..
            } => write!(f, "Foreign({}, class {})", declaring, class.class_id),
        }
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// Adapter plus the outcome of adapting to one declaring type
///
/// Shared by every descriptor declared on that type. A failed adapt is kept
/// rather than raised: the descriptors still exist and fault when evaluated.
pub struct Binding {
    adapter: Arc<dyn ObjectAdapter>,
    handle: Result<AdaptedHandle, AdaptError>,
}

impl Binding {
    /// Adapt `target` to `declaring`
    pub fn new(adapter: Arc<dyn ObjectAdapter>, target: &TargetHandle, declaring: TypeId) -> Self {
        let handle = adapter.adapt(target, declaring);
        if let Err(err) = &handle {
            tracing::warn!(
                declaring = %adapter.registry().name_of(declaring),
                "adapt failed: {}",
                err
            );
        }
        Self { adapter, handle }
    }

    /// The adapted handle, or why adapting failed
    pub fn handle(&self) -> Result<&AdaptedHandle, &AdaptError> {
        self.handle.as_ref()
    }

    /// Registry of the underlying adapter
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.adapter.registry()
    }

    /// Read a member
    pub fn get(&self, member: &Member, args: &[Value]) -> Result<Value, EvalFault> {
        let handle = self.handle.as_ref().map_err(|e| EvalFault::Adapt(e.clone()))?;
        self.adapter.get_value(handle, member, args)
    }

    /// Write a member
    pub fn set(&self, member: &Member, index: &[Value], value: Value) -> Result<(), WriteFault> {
        let handle = self.handle.as_ref().map_err(|e| WriteFault::Adapt(e.clone()))?;
        self.adapter.set_value(handle, member, index, value)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("representation", &self.adapter.representation())
            .field("handle", &self.handle)
            .finish()
    }
}

// ============================================================================
// Helpers shared by both adapters
// ============================================================================

/// Receiver over static field storage
///
/// Names resolve against the declaring type first, then its bases.
struct StaticReceiver<'a> {
    registry: &'a TypeRegistry,
    declaring: TypeId,
}

impl<'a> StaticReceiver<'a> {
    fn new(registry: &'a TypeRegistry, declaring: TypeId) -> Self {
        Self {
            registry,
            declaring,
        }
    }
}

impl Receiver for StaticReceiver<'_> {
    fn field(&self, name: &str) -> FaultResult<Value> {
        self.registry
            .ancestors(self.declaring)
            .find_map(|ty| self.registry.static_value(ty, name))
            .ok_or_else(|| Fault::missing_member(name))
    }

    fn set_field(&self, name: &str, value: Value) -> FaultResult<()> {
        let owner = self
            .registry
            .ancestors(self.declaring)
            .find(|ty| self.registry.static_value(*ty, name).is_some())
            .ok_or_else(|| Fault::missing_member(name))?;
        self.registry.set_static_value(owner, name, value);
        Ok(())
    }

    fn is_static(&self) -> bool {
        true
    }
}

/// Check that the target's runtime type derives from `declaring`
fn check_cast(
    registry: &TypeRegistry,
    target: TypeId,
    declaring: TypeId,
) -> Result<(), AdaptError> {
    if registry.is_subclass_of(target, declaring) {
        Ok(())
    } else {
        Err(AdaptError::InvalidCast {
            target: registry.name_of(target).to_string(),
            declaring: registry.name_of(declaring).to_string(),
        })
    }
}

/// Storage keeps enums as plain integers; give them back their enum type
fn normalize(registry: &TypeRegistry, declared: TypeId, value: Value) -> Value {
    let is_enum = registry
        .get(declared)
        .is_some_and(|def| matches!(def.kind, TypeKind::Enum(_)));
    if !is_enum || !value.is_integer() {
        return value;
    }
    match value.as_int() {
        Some(discriminant) => Value::enumeration(declared, discriminant),
        None => value,
    }
}
