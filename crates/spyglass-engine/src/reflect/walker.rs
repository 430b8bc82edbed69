//! Type hierarchy walking
//!
//! Produces the chain of declaring types for a type, most derived first and
//! ending at the root. The position of a type in this chain is the sort key
//! the member cache uses, so the walk must be deterministic.

use rustc_hash::FxHashSet;
use spyglass_sdk::{TypeId, TypeRegistry};

use crate::error::EnumerationError;

/// Result of walking one type's base chain
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    chain: Vec<TypeId>,
    issues: Vec<EnumerationError>,
}

impl Hierarchy {
    /// Declaring types, most derived first
    pub fn chain(&self) -> &[TypeId] {
        &self.chain
    }

    /// Number of types in the chain
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Index of a type in the chain
    pub fn position(&self, ty: TypeId) -> Option<usize> {
        self.chain.iter().position(|t| *t == ty)
    }

    /// Iterate over the chain
    pub fn iter(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.chain.iter().copied()
    }

    /// Last type reached
    pub fn root(&self) -> Option<TypeId> {
        self.chain.last().copied()
    }

    /// Problems met while walking (none of them stop the walk early unless
    /// the chain cannot be followed any further)
    pub fn issues(&self) -> &[EnumerationError] {
        &self.issues
    }
}

/// Walks base-type links through a registry
pub struct TypeHierarchyWalker<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> TypeHierarchyWalker<'r> {
    /// Create a walker over `registry`
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Follow base links from `ty` until none remain
    ///
    /// Unreflectable types stay in the chain (they just contribute no
    /// members). An unregistered base or a cycle ends the walk at the last
    /// good type.
    pub fn walk(&self, ty: TypeId) -> Hierarchy {
        let mut hierarchy = Hierarchy::default();
        let mut visited = FxHashSet::default();
        let mut current = Some(ty);

        while let Some(id) = current {
            let Some(def) = self.registry.get(id) else {
                tracing::warn!(type_id = %id, "base type is not registered; hierarchy truncated");
                hierarchy.issues.push(EnumerationError::MissingType(id));
                break;
            };

            if !visited.insert(id) {
                let err = EnumerationError::Cycle {
                    type_name: self.registry.name_of(ty).to_string(),
                    repeated: def.name.clone(),
                };
                tracing::warn!("{}", err);
                hierarchy.issues.push(err);
                break;
            }

            if let Some(reason) = &def.load_error {
                let err = EnumerationError::Unreflectable {
                    type_name: def.name.clone(),
                    reason: reason.clone(),
                };
                tracing::warn!("{}", err);
                hierarchy.issues.push(err);
            }

            hierarchy.chain.push(id);
            current = def.parent;
        }

        hierarchy
    }
}
