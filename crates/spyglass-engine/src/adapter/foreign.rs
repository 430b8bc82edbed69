//! Embedded-runtime object adapter
//!
//! Casting to a declaring type means finding the wrapper generated for it.
//! Base fields come first in every layout, so a base wrapper's slots line up
//! with the same fields of a derived instance.

use std::sync::Arc;

use spyglass_sdk::{
    Fault, FaultResult, ForeignClass, ForeignRef, ObjectRef, Receiver, Representation, TypeId,
    TypeRegistry, Value,
};

use super::{check_cast, AdaptedHandle, ObjectAdapter};
use crate::error::AdaptError;
use crate::target::TargetHandle;

/// Adapter for objects owned by a [`ForeignRuntime`](spyglass_sdk::ForeignRuntime)
pub struct ForeignAdapter {
    registry: Arc<TypeRegistry>,
}

impl ForeignAdapter {
    /// Create an adapter resolving types against `registry`
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }
}

impl ObjectAdapter for ForeignAdapter {
    fn representation(&self) -> Representation {
        Representation::Foreign
    }

    fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn adapt(&self, target: &TargetHandle, declaring: TypeId) -> Result<AdaptedHandle, AdaptError> {
        let object = match target.object() {
            None => return Ok(AdaptedHandle::Static { declaring }),
            Some(ObjectRef::Foreign(object)) => object,
            Some(ObjectRef::Native(_)) => return Err(AdaptError::WrongRepresentation("foreign")),
        };
        check_cast(&self.registry, object.type_id(), declaring)?;

        let class = object.runtime().class_for(declaring).ok_or_else(|| {
            AdaptError::MissingWrapper(self.registry.name_of(declaring).to_string())
        })?;

        Ok(AdaptedHandle::Foreign {
            declaring,
            object: object.clone(),
            class,
        })
    }

    fn instance_receiver<'a>(
        &'a self,
        handle: &'a AdaptedHandle,
    ) -> Result<Box<dyn Receiver + 'a>, AdaptError> {
        match handle {
            AdaptedHandle::Foreign { object, class, .. } => {
                Ok(Box::new(ForeignReceiver { object, class }))
            }
            _ => Err(AdaptError::WrongRepresentation("foreign")),
        }
    }
}

/// Instance view through one wrapper layout; a base wrapper only holds the
/// slots its own type can see
struct ForeignReceiver<'a> {
    object: &'a ForeignRef,
    class: &'a ForeignClass,
}

impl ForeignReceiver<'_> {
    fn slot(&self, name: &str) -> FaultResult<usize> {
        self.class
            .field_index(name)
            .ok_or_else(|| Fault::missing_member(name))
    }
}

impl Receiver for ForeignReceiver<'_> {
    fn field(&self, name: &str) -> FaultResult<Value> {
        let index = self.slot(name)?;
        self.object.runtime().read_slot(self.object.handle(), index)
    }

    fn set_field(&self, name: &str, value: Value) -> FaultResult<()> {
        let index = self.slot(name)?;
        self.object
            .runtime()
            .write_slot(self.object.handle(), index, value)
    }

    fn is_static(&self) -> bool {
        false
    }
}
