//! Member cache construction

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use spyglass_sdk::{TypeId, TypeRegistry};

use super::MemberDescriptor;
use crate::adapter::{adapter_for, Binding};
use crate::config::InspectorConfig;
use crate::error::InspectError;
use crate::reflect::{
    is_property_accessor, parameter_suffix, signature, Blacklist, Member, MemberKind, MemberQuery,
    QueryFlags, ReflectedMember, Scope, TypeHierarchyWalker,
};
use crate::target::TargetHandle;

/// Builds the sorted, deduplicated descriptor array for a target
///
/// Order: properties, then fields, then methods; within each group by the
/// declaring type's position in the hierarchy (most derived first), then by
/// name.
pub struct MemberCacheBuilder {
    registry: Arc<TypeRegistry>,
    blacklist: Blacklist,
    include_non_public: bool,
}

impl MemberCacheBuilder {
    /// Create a builder with the default blacklist
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            blacklist: Blacklist::builtin().clone(),
            include_non_public: true,
        }
    }

    /// Create a builder from session settings
    pub fn with_config(registry: Arc<TypeRegistry>, config: &InspectorConfig) -> Self {
        Self {
            registry,
            blacklist: Blacklist::with_patterns(&config.blacklist),
            include_non_public: config.include_non_public,
        }
    }

    /// Replace the blacklist
    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    /// Registry the builder reflects over
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Build the cache
    ///
    /// Fails only when the target itself cannot be inspected. Per-member
    /// problems are logged and the member skipped, or (for adapt failures)
    /// carried by the descriptors so they fault when evaluated.
    pub fn build(
        &self,
        target: &TargetHandle,
        scope: Scope,
    ) -> Result<Vec<MemberDescriptor>, InspectError> {
        let registry = &self.registry;
        let ty = target.declared_type();
        if registry.get(ty).is_none() {
            return Err(InspectError::UnknownType(ty));
        }
        if !target.is_alive() {
            return Err(InspectError::DestroyedTarget {
                type_name: registry.name_of(ty).to_string(),
            });
        }

        let scope = match (target.is_static(), scope) {
            (true, Scope::Instance) => return Ok(Vec::new()),
            (true, _) => Scope::Static,
            (false, scope) => scope,
        };

        let hierarchy = TypeHierarchyWalker::new(registry).walk(ty);
        let flags = QueryFlags {
            scope,
            include_non_public: self.include_non_public,
        };
        let mut query = MemberQuery::new(registry, &hierarchy, flags);
        let adapter = adapter_for(registry, target);

        let mut bindings: FxHashMap<TypeId, Arc<Binding>> = FxHashMap::default();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut descriptors = Vec::new();
        let mut skipped = 0usize;

        for current in hierarchy.iter() {
            let result = query.members_of(current);
            skipped += result.errors.len();

            for reflected in result.members {
                let declaring = reflected.declaring;
                let member = reflected.member.into_setter();
                let sig = signature(registry, declaring, member.name());

                if self.blacklist.is_blocked(&sig) {
                    tracing::trace!(member = %sig, "blacklisted");
                    continue;
                }
                if member.kind() == MemberKind::Method && self.is_accessor(declaring, &member) {
                    continue;
                }
                let key = format!("{}{}", sig, parameter_suffix(registry, member.parameters()));
                if !seen.insert(key) {
                    continue;
                }

                let binding = bindings
                    .entry(declaring)
                    .or_insert_with(|| {
                        Arc::new(Binding::new(Arc::clone(&adapter), target, declaring))
                    })
                    .clone();
                let declaring_index = hierarchy.position(declaring).unwrap_or(usize::MAX);
                descriptors.push(MemberDescriptor::new(
                    sig,
                    declaring_index,
                    ReflectedMember { declaring, member },
                    binding,
                ));
            }
        }

        descriptors.sort_by(|a, b| {
            let left = (a.kind(), a.declaring_index(), a.name());
            left.cmp(&(b.kind(), b.declaring_index(), b.name()))
        });

        tracing::debug!(
            target_type = %registry.name_of(ty),
            members = descriptors.len(),
            skipped,
            "member cache built"
        );
        Ok(descriptors)
    }

    /// `get_X`/`set_X` methods duplicating a property of the same type
    fn is_accessor(&self, declaring: TypeId, member: &Member) -> bool {
        if matches!(member, Member::Setter { .. }) {
            return false;
        }
        self.registry.get(declaring).is_some_and(|def| {
            is_property_accessor(
                member.name(),
                def.properties.iter().map(|p| p.name.as_str()),
            )
        })
    }
}
