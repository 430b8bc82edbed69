//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use std::sync::Arc;

use spyglass_engine::{InspectorConfig, InspectorSession, TargetHandle};
use spyglass_sdk::{
    Fault, FieldDef, MethodDef, NativeObject, ObjectRef, ParameterDef, PropertyDef, TypeDef,
    TypeId, TypeRegistry, Value, Visibility,
};

/// Type ids of the game-like fixture hierarchy
pub struct Types {
    pub component: TypeId,
    pub transform: TypeId,
    pub player: TypeId,
    pub team: TypeId,
    pub vector3: TypeId,
}

/// `Component <- Transform <- Player`, plus an enum and a struct
pub fn game_registry() -> (Arc<TypeRegistry>, Types) {
    let mut registry = TypeRegistry::new();

    let team = registry.register(TypeDef::enumeration(
        "Team",
        [("Red", 0), ("Blue", 1), ("Spectator", 7)],
    ));
    let vector3 = registry.register(
        TypeDef::structure("Vector3")
            .with_field(FieldDef::new("x", TypeId::FLOAT))
            .with_field(FieldDef::new("y", TypeId::FLOAT))
            .with_field(FieldDef::new("z", TypeId::FLOAT)),
    );

    let component = registry.register(
        TypeDef::class("Component")
            .with_field(FieldDef::new("enabled", TypeId::BOOL).with_default(true))
            .with_field(
                FieldDef::new("instance_id", TypeId::INT)
                    .as_readonly()
                    .with_default(42),
            )
            .with_field(
                FieldDef::new("registry_count", TypeId::INT)
                    .as_static()
                    .with_default(3),
            )
            .with_property(
                PropertyDef::new("Name", TypeId::STRING).getter(|r, _| {
                    let id = r.field("instance_id")?.as_int().unwrap_or(0);
                    Ok(Value::str(&format!("Component#{}", id)))
                }),
            )
            .with_method(MethodDef::new("Finalize", TypeId::VOID, |_, _| Ok(Value::Null)))
            .with_method(MethodDef::new("ToString", TypeId::STRING, |_, _| {
                Ok(Value::str("Component"))
            })),
    );

    let transform = registry.register(
        TypeDef::class("Transform")
            .extends(component)
            .with_field(FieldDef::new("position", vector3))
            .with_property(
                PropertyDef::new("Position", vector3)
                    .getter(|r, _| r.field("position"))
                    .setter(|r, _, v| r.set_field("position", v)),
            )
            .with_property(
                PropertyDef::new("Rotation", TypeId::FLOAT).getter(|_, _| Ok(Value::Float(0.0))),
            )
            .with_property(
                PropertyDef::new("Scale", TypeId::FLOAT).getter(|_, _| Ok(Value::Float(1.0))),
            )
            .with_method(
                MethodDef::new("ToString", TypeId::STRING, |_, _| Ok(Value::str("Transform")))
                    .as_override(),
            ),
    );

    let player = registry.register(
        TypeDef::class("Player")
            .extends(transform)
            .with_field(FieldDef::new("name", TypeId::STRING).with_default("hero"))
            .with_field(FieldDef::new("health", TypeId::INT).with_default(100))
            .with_field(FieldDef::new("team", team).with_default(Value::enumeration(team, 1)))
            .with_field(
                FieldDef::new("inventory", TypeId::OBJECT).with_visibility(Visibility::Private),
            )
            .with_field(
                FieldDef::new("volume", TypeId::FLOAT)
                    .with_visibility(Visibility::Private)
                    .with_default(0.5),
            )
            .with_property(
                PropertyDef::new("Target", TypeId::OBJECT).getter(|_, _| {
                    Err(Fault::null_reference("Object reference not set to an instance"))
                }),
            )
            .with_property(
                PropertyDef::new("Volume", TypeId::FLOAT)
                    .setter(|r, _, v| r.set_field("volume", v)),
            )
            .with_property(
                PropertyDef::new("Item", TypeId::STRING)
                    .indexed(ParameterDef::new("slot", TypeId::INT))
                    .getter(|_, args| match args.first().and_then(Value::as_int) {
                        Some(slot) => Ok(Value::str(&format!("item-{}", slot))),
                        None => Err(Fault::argument("slot is required")),
                    }),
            )
            .with_method(
                MethodDef::new("Damage", TypeId::INT, |r, args| {
                    let amount = args.first().and_then(Value::as_int).unwrap_or(0);
                    let health = r.field("health")?.as_int().unwrap_or(0);
                    r.set_field("health", Value::Int(health - amount))?;
                    Ok(Value::Int(health - amount))
                })
                .with_param(ParameterDef::new("amount", TypeId::INT)),
            )
            .with_method(
                MethodDef::new("get_Item", TypeId::STRING, |_, _| Ok(Value::Null))
                    .with_param(ParameterDef::new("slot", TypeId::INT)),
            ),
    );

    (
        Arc::new(registry),
        Types {
            component,
            transform,
            player,
            team,
            vector3,
        },
    )
}

/// A live player object
pub fn player(registry: &Arc<TypeRegistry>, types: &Types) -> Arc<NativeObject> {
    let obj = NativeObject::instantiate(registry, types.player);
    obj.set(
        "inventory",
        Value::list(vec![Value::str("sword"), Value::str("shield")]),
    );
    Arc::new(obj)
}

/// Open a session over a native object
pub fn open(
    registry: &Arc<TypeRegistry>,
    object: &Arc<NativeObject>,
    config: InspectorConfig,
) -> InspectorSession {
    let value = Value::Object(ObjectRef::Native(Arc::clone(object)));
    let target = TargetHandle::instance(registry, &value).expect("valid target");
    InspectorSession::open(Arc::clone(registry), target, config).expect("session opens")
}

/// Index of a member by signature, panicking if absent
pub fn index_of(session: &InspectorSession, signature: &str) -> usize {
    session
        .find(signature)
        .unwrap_or_else(|| panic!("{} not cached", signature))
}

/// Signatures of the whole cache, in order
pub fn signatures(session: &InspectorSession) -> Vec<String> {
    session
        .descriptors()
        .iter()
        .map(|d| d.signature().to_string())
        .collect()
}
