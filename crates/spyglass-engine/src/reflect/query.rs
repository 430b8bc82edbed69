//! Member queries
//!
//! Asking a type for its members returns what it declares plus what it
//! inherits, each tagged with the type that declares it, the way a runtime
//! reflection API does. Private members of base types are not inherited.
//! A member marked as an override hides the base members with the same name
//! and parameter list.
//!
//! Querying every type of a hierarchy in turn therefore reports inherited
//! members several times. The cache builder removes those repeats by
//! signature; [`MemberQuery`] only removes the overridden ones.

use std::fmt;

use rustc_hash::FxHashMap;
use spyglass_sdk::{
    FieldDef, MethodDef, ParameterDef, PropertyDef, TypeDef, TypeId, TypeRegistry, Visibility,
};

use crate::error::EnumerationError;
use crate::reflect::walker::Hierarchy;

/// Which members a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Static members only
    Static,
    /// Instance members only
    Instance,
    /// Both
    #[default]
    All,
}

impl Scope {
    /// Whether a member with the given staticness is in scope
    pub fn admits(self, is_static: bool) -> bool {
        match self {
            Scope::Static => is_static,
            Scope::Instance => !is_static,
            Scope::All => true,
        }
    }
}

/// Query options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFlags {
    /// Static, instance or both
    pub scope: Scope,
    /// Include protected and private members
    pub include_non_public: bool,
}

impl Default for QueryFlags {
    fn default() -> Self {
        Self {
            scope: Scope::All,
            include_non_public: true,
        }
    }
}

/// Member category, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    /// Property or indexer
    Property,
    /// Field
    Field,
    /// Method (including setters of write-only properties)
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Property => write!(f, "Property"),
            MemberKind::Field => write!(f, "Field"),
            MemberKind::Method => write!(f, "Method"),
        }
    }
}

/// A reflected member definition
#[derive(Debug, Clone)]
pub enum Member {
    /// Field
    Field(FieldDef),
    /// Property or indexer
    Property(PropertyDef),
    /// Method
    Method(MethodDef),
    /// Write-only property exposed as a `set_<Name>` method
    Setter {
        /// Pseudo-method name
        name: String,
        /// The property whose setter is invoked
        property: PropertyDef,
        /// Index parameters followed by the value parameter
        params: Vec<ParameterDef>,
    },
}

impl Member {
    /// Member name
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => &f.name,
            Member::Property(p) => &p.name,
            Member::Method(m) => &m.name,
            Member::Setter { name, .. } => name,
        }
    }

    /// Member category
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Field(_) => MemberKind::Field,
            Member::Property(_) => MemberKind::Property,
            Member::Method(_) | Member::Setter { .. } => MemberKind::Method,
        }
    }

    /// Whether the member is static
    pub fn is_static(&self) -> bool {
        match self {
            Member::Field(f) => f.is_static,
            Member::Property(p) | Member::Setter { property: p, .. } => p.is_static,
            Member::Method(m) => m.is_static,
        }
    }

    /// Declared type of the value the member produces
    pub fn value_type(&self) -> TypeId {
        match self {
            Member::Field(f) => f.ty,
            Member::Property(p) => p.ty,
            Member::Method(m) => m.return_type,
            Member::Setter { .. } => TypeId::VOID,
        }
    }

    /// Parameters that must be supplied before evaluation
    pub fn parameters(&self) -> &[ParameterDef] {
        match self {
            Member::Field(_) => &[],
            Member::Property(p) => &p.index_params,
            Member::Method(m) => &m.params,
            Member::Setter { params, .. } => params,
        }
    }

    /// Whether the member's value can be assigned
    pub fn can_write(&self) -> bool {
        match self {
            Member::Field(f) => !f.is_readonly,
            Member::Property(p) => p.setter.is_some(),
            Member::Method(_) | Member::Setter { .. } => false,
        }
    }

    /// Member visibility
    pub fn visibility(&self) -> Visibility {
        match self {
            Member::Field(f) => f.visibility,
            Member::Property(p) | Member::Setter { property: p, .. } => p.visibility,
            Member::Method(m) => m.visibility,
        }
    }

    /// Whether the member overrides a base member
    pub fn is_override(&self) -> bool {
        match self {
            Member::Field(_) => false,
            Member::Property(p) | Member::Setter { property: p, .. } => p.is_override,
            Member::Method(m) => m.is_override,
        }
    }

    /// Whether this is a property with a setter but no getter
    pub fn is_write_only(&self) -> bool {
        matches!(self, Member::Property(p) if p.getter.is_none() && p.setter.is_some())
    }

    /// Turn a write-only property into its setter pseudo-method
    ///
    /// Any other member is returned unchanged.
    pub fn into_setter(self) -> Member {
        match self {
            Member::Property(p) if p.getter.is_none() && p.setter.is_some() => {
                let mut params = p.index_params.clone();
                params.push(ParameterDef::new("value", p.ty));
                Member::Setter {
                    name: format!("set_{}", p.name),
                    property: p,
                    params,
                }
            }
            other => other,
        }
    }

    /// Every type the member's signature refers to
    fn referenced_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::once(self.value_type()).chain(self.parameters().iter().map(|p| p.ty))
    }
}

/// A member tagged with the type that declares it
#[derive(Debug, Clone)]
pub struct ReflectedMember {
    /// Declaring type
    pub declaring: TypeId,
    /// Member definition
    pub member: Member,
}

/// Result of querying one type
#[derive(Debug, Default)]
pub struct QueryResult {
    /// Members, declared first then inherited
    pub members: Vec<ReflectedMember>,
    /// Members that were skipped, and why
    pub errors: Vec<EnumerationError>,
}

/// Display signature `Type.Member`
pub fn signature(registry: &TypeRegistry, declaring: TypeId, name: &str) -> String {
    format!("{}.{}", registry.name_of(declaring), name)
}

/// Parameter list suffix `(int,string)` used to tell overloads apart
pub fn parameter_suffix(registry: &TypeRegistry, params: &[ParameterDef]) -> String {
    let names: Vec<&str> = params.iter().map(|p| registry.name_of(p.ty)).collect();
    format!("({})", names.join(","))
}

/// Member queries over one hierarchy
///
/// Remembers overrides across calls, so querying the hierarchy's types from
/// most derived to base never reports a base member that a derived type has
/// already overridden.
pub struct MemberQuery<'r> {
    registry: &'r TypeRegistry,
    hierarchy: &'r Hierarchy,
    flags: QueryFlags,
    /// Override key -> type declaring the override
    overrides: FxHashMap<String, TypeId>,
}

impl<'r> MemberQuery<'r> {
    /// Create a query over `hierarchy`
    pub fn new(registry: &'r TypeRegistry, hierarchy: &'r Hierarchy, flags: QueryFlags) -> Self {
        Self {
            registry,
            hierarchy,
            flags,
            overrides: FxHashMap::default(),
        }
    }

    /// Declared and inherited members of `ty`
    ///
    /// `ty` must be part of the hierarchy; other types yield nothing.
    pub fn members_of(&mut self, ty: TypeId) -> QueryResult {
        let mut result = QueryResult::default();
        let Some(start) = self.hierarchy.position(ty) else {
            return result;
        };

        let registry = self.registry;
        let hierarchy = self.hierarchy;
        for (depth, declaring) in hierarchy.chain()[start..].iter().enumerate() {
            let Some(def) = registry.get(*declaring) else {
                continue;
            };
            if !def.is_reflectable() {
                // The walker has already reported it
                continue;
            }

            let inherited = depth > 0;
            for member in Self::declared(def) {
                if !self.flags.scope.admits(member.is_static())
                    || !self.visible(member.visibility(), inherited)
                {
                    continue;
                }

                if member.kind() != MemberKind::Field {
                    let key = format!(
                        "{}{}",
                        member.name(),
                        parameter_suffix(registry, member.parameters())
                    );
                    match self.overrides.get(&key).copied() {
                        Some(owner) if owner != *declaring => continue,
                        Some(_) => {}
                        None if member.is_override() => {
                            self.overrides.insert(key, *declaring);
                        }
                        None => {}
                    }
                }

                if let Some(missing) = member
                    .referenced_types()
                    .find(|t| registry.get(*t).is_none())
                {
                    let err = EnumerationError::UnresolvedMemberType {
                        signature: signature(registry, *declaring, member.name()),
                        ty: missing,
                    };
                    tracing::warn!("skipping member: {}", err);
                    result.errors.push(err);
                    continue;
                }

                result.members.push(ReflectedMember {
                    declaring: *declaring,
                    member,
                });
            }
        }

        result
    }

    fn visible(&self, visibility: Visibility, inherited: bool) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Protected => self.flags.include_non_public,
            Visibility::Private => self.flags.include_non_public && !inherited,
        }
    }

    fn declared(def: &TypeDef) -> impl Iterator<Item = Member> + '_ {
        def.properties
            .iter()
            .cloned()
            .map(Member::Property)
            .chain(def.fields.iter().cloned().map(Member::Field))
            .chain(def.methods.iter().cloned().map(Member::Method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::walker::TypeHierarchyWalker;
    use spyglass_sdk::Value;

    fn constant(v: i64) -> MethodDef {
        MethodDef::new("Describe", TypeId::INT, move |_, _| Ok(Value::Int(v)))
    }

    fn names(result: &QueryResult) -> Vec<String> {
        result
            .members
            .iter()
            .map(|m| format!("{}:{}", m.declaring.0, m.member.name()))
            .collect()
    }

    #[test]
    fn test_inherited_members_are_tagged_with_declaring_type() {
        let mut registry = TypeRegistry::new();
        let base = registry.register(
            TypeDef::class("Base")
                .with_field(FieldDef::new("id", TypeId::INT))
                .with_field(
                    FieldDef::new("secret", TypeId::INT).with_visibility(Visibility::Private),
                ),
        );
        let derived = registry.register(
            TypeDef::class("Derived")
                .extends(base)
                .with_field(FieldDef::new("hp", TypeId::INT)),
        );

        let hierarchy = TypeHierarchyWalker::new(&registry).walk(derived);
        let mut query = MemberQuery::new(&registry, &hierarchy, QueryFlags::default());
        let result = query.members_of(derived);
        assert_eq!(
            names(&result),
            vec![format!("{}:hp", derived.0), format!("{}:id", base.0)]
        );

        // The private field is reported by the base's own query
        let result = query.members_of(base);
        assert_eq!(
            names(&result),
            vec![format!("{}:id", base.0), format!("{}:secret", base.0)]
        );
    }

    #[test]
    fn test_override_hides_base_member_across_queries() {
        let mut registry = TypeRegistry::new();
        let base = registry.register(TypeDef::class("Base").with_method(constant(1)));
        let derived = registry.register(
            TypeDef::class("Derived")
                .extends(base)
                .with_method(constant(2).as_override()),
        );

        let hierarchy = TypeHierarchyWalker::new(&registry).walk(derived);
        let mut query = MemberQuery::new(&registry, &hierarchy, QueryFlags::default());
        assert_eq!(
            names(&query.members_of(derived)),
            vec![format!("{}:Describe", derived.0)]
        );
        assert!(query.members_of(base).members.is_empty());
    }

    #[test]
    fn test_overload_is_not_an_override() {
        let mut registry = TypeRegistry::new();
        let base = registry.register(TypeDef::class("Base").with_method(constant(1)));
        let derived = registry.register(
            TypeDef::class("Derived").extends(base).with_method(
                constant(2)
                    .as_override()
                    .with_param(ParameterDef::new("verbose", TypeId::BOOL)),
            ),
        );

        let hierarchy = TypeHierarchyWalker::new(&registry).walk(derived);
        let mut query = MemberQuery::new(&registry, &hierarchy, QueryFlags::default());
        assert_eq!(query.members_of(derived).members.len(), 2);
    }

    #[test]
    fn test_scope_and_visibility_flags() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(
            TypeDef::class("Counter")
                .with_field(FieldDef::new("total", TypeId::INT).as_static())
                .with_field(FieldDef::new("value", TypeId::INT))
                .with_field(
                    FieldDef::new("cache", TypeId::INT).with_visibility(Visibility::Protected),
                ),
        );
        let hierarchy = TypeHierarchyWalker::new(&registry).walk(ty);

        let flags = QueryFlags {
            scope: Scope::Static,
            include_non_public: true,
        };
        let result = MemberQuery::new(&registry, &hierarchy, flags).members_of(ty);
        assert_eq!(names(&result), vec![format!("{}:total", ty.0)]);

        let flags = QueryFlags {
            scope: Scope::Instance,
            include_non_public: false,
        };
        let result = MemberQuery::new(&registry, &hierarchy, flags).members_of(ty);
        assert_eq!(names(&result), vec![format!("{}:value", ty.0)]);
    }

    #[test]
    fn test_unresolved_member_type_is_skipped() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(
            TypeDef::class("Loose")
                .with_field(FieldDef::new("ghost", TypeId(999)))
                .with_field(FieldDef::new("ok", TypeId::BOOL)),
        );
        let hierarchy = TypeHierarchyWalker::new(&registry).walk(ty);
        let result = MemberQuery::new(&registry, &hierarchy, QueryFlags::default()).members_of(ty);

        assert_eq!(names(&result), vec![format!("{}:ok", ty.0)]);
        assert_eq!(
            result.errors,
            vec![EnumerationError::UnresolvedMemberType {
                signature: "Loose.ghost".to_string(),
                ty: TypeId(999),
            }]
        );
    }

    #[test]
    fn test_write_only_property_becomes_setter() {
        let prop = PropertyDef::new("Volume", TypeId::FLOAT).setter(|_, _, _| Ok(()));
        let member = Member::Property(prop);
        assert!(member.is_write_only());

        let setter = member.into_setter();
        assert_eq!(setter.name(), "set_Volume");
        assert_eq!(setter.kind(), MemberKind::Method);
        assert_eq!(setter.value_type(), TypeId::VOID);
        assert_eq!(setter.parameters().len(), 1);
        assert!(!setter.can_write());
    }

    #[test]
    fn test_kind_order() {
        assert!(MemberKind::Property < MemberKind::Field);
        assert!(MemberKind::Field < MemberKind::Method);
    }
}
