//! Inspection targets

use spyglass_sdk::{NativeObject, ObjectRef, Representation, TypeId, TypeRegistry, Value};

use crate::error::InspectError;

/// The object or type a session inspects
///
/// Immutable for the life of a session; inspecting something else means
/// creating a new handle (and a new session).
#[derive(Debug, Clone)]
pub struct TargetHandle {
    declared_type: TypeId,
    is_static: bool,
    representation: Representation,
    instance: Option<ObjectRef>,
}

impl TargetHandle {
    /// Inspect a live value
    ///
    /// Objects are inspected in place. Struct values are boxed into a host
    /// object first, so writes made through the session change the boxed
    /// copy and not the value they were read from.
    pub fn instance(registry: &TypeRegistry, value: &Value) -> Result<Self, InspectError> {
        match value {
            Value::Object(obj) => {
                let ty = obj.type_id();
                if registry.get(ty).is_none() {
                    return Err(InspectError::UnknownType(ty));
                }
                if !obj.is_alive() {
                    return Err(InspectError::DestroyedTarget {
                        type_name: registry.name_of(ty).to_string(),
                    });
                }
                Ok(Self {
                    declared_type: ty,
                    is_static: false,
                    representation: obj.representation(),
                    instance: Some(obj.clone()),
                })
            }
            Value::Struct(s) => {
                if registry.get(s.ty).is_none() {
                    return Err(InspectError::UnknownType(s.ty));
                }
                let boxed = s
                    .fields
                    .iter()
                    .fold(NativeObject::new(s.ty), |obj, (name, v)| {
                        obj.with_field(name.clone(), v.clone())
                    });
                Ok(Self {
                    declared_type: s.ty,
                    is_static: false,
                    representation: Representation::Native,
                    instance: Some(ObjectRef::native(boxed)),
                })
            }
            Value::Null => Err(InspectError::InvalidTarget("value is null".to_string())),
            other => Err(InspectError::InvalidTarget(format!(
                "a {} value has no members to inspect",
                other.type_name()
            ))),
        }
    }

    /// Inspect the static members of a type
    pub fn static_type(registry: &TypeRegistry, ty: TypeId) -> Result<Self, InspectError> {
        if registry.get(ty).is_none() {
            return Err(InspectError::UnknownType(ty));
        }
        Ok(Self {
            declared_type: ty,
            is_static: true,
            representation: Representation::Native,
            instance: None,
        })
    }

    /// Type whose members are inspected
    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    /// Whether only static members are inspected
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Object model of the instance (`Native` for static targets)
    pub fn representation(&self) -> Representation {
        self.representation
    }

    /// The inspected instance, `None` for static targets
    pub fn object(&self) -> Option<&ObjectRef> {
        self.instance.as_ref()
    }

    /// Whether the target can still be accessed
    pub fn is_alive(&self) -> bool {
        self.instance.as_ref().map_or(true, ObjectRef::is_alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spyglass_sdk::{StructValue, TypeDef};

    #[test]
    fn test_primitives_are_not_targets() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            TargetHandle::instance(&registry, &Value::Int(3)),
            Err(InspectError::InvalidTarget(_))
        ));
        assert!(matches!(
            TargetHandle::instance(&registry, &Value::Null),
            Err(InspectError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_destroyed_object_is_fatal() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(TypeDef::class("Thing"));
        let obj = ObjectRef::native(NativeObject::new(ty));
        if let ObjectRef::Native(inner) = &obj {
            inner.destroy();
        }
        let err = TargetHandle::instance(&registry, &Value::Object(obj)).unwrap_err();
        assert_eq!(
            err,
            InspectError::DestroyedTarget {
                type_name: "Thing".to_string()
            }
        );
    }

    #[test]
    fn test_struct_is_boxed() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(TypeDef::structure("Vector2"));
        let value = Value::Struct(StructValue::new(ty).with("x", 1.0).with("y", 2.0));

        let target = TargetHandle::instance(&registry, &value).unwrap();
        assert_eq!(target.representation(), Representation::Native);
        match target.object() {
            Some(ObjectRef::Native(obj)) => assert_eq!(obj.get("y"), Some(Value::Float(2.0))),
            other => panic!("expected boxed native object, got {:?}", other),
        }
    }

    #[test]
    fn test_static_target() {
        let registry = TypeRegistry::new();
        let target = TargetHandle::static_type(&registry, TypeId::STRING).unwrap();
        assert!(target.is_static());
        assert!(target.object().is_none());
        assert!(target.is_alive());
        assert!(TargetHandle::static_type(&registry, TypeId(500)).is_err());
    }
}
