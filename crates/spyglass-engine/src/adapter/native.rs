//! Host object adapter

use std::sync::Arc;

use spyglass_sdk::{
    Fault, FaultResult, NativeObject, ObjectRef, Receiver, Representation, TypeId, TypeRegistry,
    Value,
};

use super::{check_cast, AdaptedHandle, ObjectAdapter};
use crate::error::AdaptError;
use crate::target::TargetHandle;

/// Adapter for host objects with named field storage
pub struct NativeAdapter {
    registry: Arc<TypeRegistry>,
}

impl NativeAdapter {
    /// Create an adapter resolving types against `registry`
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }
}

impl ObjectAdapter for NativeAdapter {
    fn representation(&self) -> Representation {
        Representation::Native
    }

    fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn adapt(&self, target: &TargetHandle, declaring: TypeId) -> Result<AdaptedHandle, AdaptError> {
        let object = match target.object() {
            None => return Ok(AdaptedHandle::Static { declaring }),
            Some(ObjectRef::Native(object)) => object,
            Some(ObjectRef::Foreign(_)) => return Err(AdaptError::WrongRepresentation("native")),
        };
        check_cast(&self.registry, object.type_id(), declaring)?;
        Ok(AdaptedHandle::Native {
            declaring,
            object: Arc::clone(object),
        })
    }

    fn instance_receiver<'a>(
        &'a self,
        handle: &'a AdaptedHandle,
    ) -> Result<Box<dyn Receiver + 'a>, AdaptError> {
        match handle {
            AdaptedHandle::Native { declaring, object } => Ok(Box::new(NativeReceiver {
                registry: &self.registry,
                declaring: *declaring,
                object: object.as_ref(),
            })),
            _ => Err(AdaptError::WrongRepresentation("native")),
        }
    }
}

/// Instance view of a host object as one declaring type
///
/// Field names resolve to the nearest declaration on the declaring type or
/// its ancestors, so a base type's view never sees a derived field that
/// hides one of its own.
struct NativeReceiver<'a> {
    registry: &'a TypeRegistry,
    declaring: TypeId,
    object: &'a NativeObject,
}

impl NativeReceiver<'_> {
    fn live(&self) -> FaultResult<&NativeObject> {
        if self.object.is_destroyed() {
            Err(Fault::null_reference("the object has been destroyed"))
        } else {
            Ok(self.object)
        }
    }

    fn owner(&self, object: &NativeObject, name: &str) -> FaultResult<TypeId> {
        self.registry
            .ancestors(self.declaring)
            .find(|ty| object.has_declared(*ty, name))
            .ok_or_else(|| Fault::missing_member(name))
    }
}

impl Receiver for NativeReceiver<'_> {
    fn field(&self, name: &str) -> FaultResult<Value> {
        let object = self.live()?;
        let owner = self.owner(object, name)?;
        object
            .get_declared(owner, name)
            .ok_or_else(|| Fault::missing_member(name))
    }

    fn set_field(&self, name: &str, value: Value) -> FaultResult<()> {
        let object = self.live()?;
        let owner = self.owner(object, name)?;
        if object.set_declared(owner, name, value) {
            Ok(())
        } else {
            Err(Fault::missing_member(name))
        }
    }

    fn is_static(&self) -> bool {
        false
    }
}
