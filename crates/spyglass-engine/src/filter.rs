//! Filter engine
//!
//! Filtering never copies or reorders the descriptor array. It produces a
//! [`FilteredView`]: the strictly increasing indices of the descriptors that
//! pass every active predicate. Any predicate change recomputes the view in
//! full; descriptor counts are bounded by type metadata, not by live data.

use crate::cache::MemberDescriptor;
use crate::reflect::{MemberKind, Scope};

/// Member kinds admitted by a filter (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindMask(u8);

impl KindMask {
    /// Nothing
    pub const NONE: Self = Self(0x00);
    /// Properties and indexers
    pub const PROPERTY: Self = Self(0x01);
    /// Fields
    pub const FIELD: Self = Self(0x02);
    /// Methods
    pub const METHOD: Self = Self(0x04);
    /// Everything
    pub const ALL: Self = Self(0x07);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Mask admitting a single kind
    pub const fn of(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Property => Self::PROPERTY,
            MemberKind::Field => Self::FIELD,
            MemberKind::Method => Self::METHOD,
        }
    }

    /// Check if the mask contains all flags of `other`
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if a member kind is admitted
    pub const fn admits(&self, kind: MemberKind) -> bool {
        self.contains(Self::of(kind))
    }

    /// Union of masks
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Mask without the flags of `other`
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl Default for KindMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<MemberKind> for KindMask {
    fn from(kind: MemberKind) -> Self {
        Self::of(kind)
    }
}

/// Active predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    name: Option<String>,
    /// Admitted member kinds
    pub kinds: KindMask,
    /// Admitted staticness
    pub scope: Scope,
}

impl MemberFilter {
    /// Filter admitting everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name predicate (case-insensitive substring); empty clears it
    pub fn with_name(mut self, needle: &str) -> Self {
        self.set_name(needle);
        self
    }

    /// Set the kind predicate
    pub fn with_kinds(mut self, kinds: KindMask) -> Self {
        self.kinds = kinds;
        self
    }

    /// Set the scope predicate
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Replace the name predicate
    pub fn set_name(&mut self, needle: &str) {
        let needle = needle.trim();
        self.name = if needle.is_empty() {
            None
        } else {
            Some(needle.to_lowercase())
        };
    }

    /// Lowercased name predicate, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether no predicate is active
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kinds == KindMask::ALL && self.scope == Scope::All
    }

    /// Check a single descriptor
    pub fn matches(&self, descriptor: &MemberDescriptor) -> bool {
        if !self.kinds.admits(descriptor.kind()) || !self.scope.admits(descriptor.is_static()) {
            return false;
        }
        match &self.name {
            Some(needle) => descriptor.name().to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

/// Indices of the descriptors passing a filter, in cache order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    indices: Vec<usize>,
}

impl FilteredView {
    /// View over every one of `len` descriptors
    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
        }
    }

    /// Number of matching descriptors
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if nothing matched
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Descriptor index at a view position
    pub fn get(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    /// Iterate descriptor indices
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Descriptor indices as a slice
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// View position of a descriptor index
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.indices.binary_search(&index).ok()
    }
}

/// Applies a [`MemberFilter`] to a descriptor array
pub struct FilterEngine;

impl FilterEngine {
    /// Recompute the view from scratch
    pub fn filter(descriptors: &[MemberDescriptor], filter: &MemberFilter) -> FilteredView {
        if filter.is_empty() {
            return FilteredView::all(descriptors.len());
        }
        let indices = descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| filter.matches(d))
            .map(|(i, _)| i)
            .collect();
        FilteredView { indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemberCacheBuilder;
    use crate::target::TargetHandle;
    use spyglass_sdk::{
        FieldDef, MethodDef, NativeObject, ObjectRef, PropertyDef, TypeDef, TypeId, TypeRegistry,
        Value,
    };
    use std::sync::Arc;

    fn transform_cache() -> Vec<MemberDescriptor> {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(
            TypeDef::class("Transform")
                .with_property(
                    PropertyDef::new("Position", TypeId::FLOAT).getter(|_, _| Ok(Value::Float(0.0))),
                )
                .with_property(
                    PropertyDef::new("Rotation", TypeId::FLOAT).getter(|_, _| Ok(Value::Float(0.0))),
                )
                .with_property(
                    PropertyDef::new("Scale", TypeId::FLOAT).getter(|_, _| Ok(Value::Float(1.0))),
                )
                .with_field(FieldDef::new("count", TypeId::INT).as_static())
                .with_method(MethodDef::new("Reset", TypeId::VOID, |_, _| Ok(Value::Null))),
        );
        let registry = Arc::new(registry);
        let obj = ObjectRef::native(NativeObject::instantiate(&registry, ty));
        let target = TargetHandle::instance(&registry, &Value::Object(obj)).unwrap();
        MemberCacheBuilder::new(Arc::clone(&registry))
            .build(&target, Scope::All)
            .unwrap()
    }

    fn names(cache: &[MemberDescriptor], view: &FilteredView) -> Vec<String> {
        view.iter().map(|i| cache[i].name().to_string()).collect()
    }

    #[test]
    fn test_name_filter_is_case_insensitive_substring() {
        let cache = transform_cache();
        let view = FilterEngine::filter(&cache, &MemberFilter::new().with_name("pos"));
        assert_eq!(names(&cache, &view), vec!["Position"]);

        let view = FilterEngine::filter(&cache, &MemberFilter::new().with_name("TIO"));
        assert_eq!(names(&cache, &view), vec!["Position", "Rotation"]);
    }

    #[test]
    fn test_kind_and_scope_filters() {
        let cache = transform_cache();
        let filter = MemberFilter::new().with_kinds(KindMask::FIELD.union(KindMask::METHOD));
        let view = FilterEngine::filter(&cache, &filter);
        assert_eq!(names(&cache, &view), vec!["count", "Reset"]);

        let view = FilterEngine::filter(&cache, &MemberFilter::new().with_scope(Scope::Static));
        assert_eq!(names(&cache, &view), vec!["count"]);
    }

    #[test]
    fn test_view_indices_are_increasing() {
        let cache = transform_cache();
        let view = FilterEngine::filter(&cache, &MemberFilter::new().with_name("a"));
        assert!(view.as_slice().windows(2).all(|w| w[0] < w[1]));
        assert!(view.iter().all(|i| cache[i].name().to_lowercase().contains('a')));
        assert_eq!(view.position_of(view.get(1).unwrap()), Some(1));
    }

    #[test]
    fn test_empty_needle_clears_name_predicate() {
        let cache = transform_cache();
        let filter = MemberFilter::new().with_name("pos").with_name("  ");
        assert!(filter.is_empty());
        assert_eq!(FilterEngine::filter(&cache, &filter).len(), cache.len());
    }

    #[test]
    fn test_kind_mask_flags() {
        assert!(KindMask::ALL.admits(MemberKind::Method));
        assert!(!KindMask::PROPERTY.admits(MemberKind::Field));
        assert_eq!(KindMask::ALL.difference(KindMask::METHOD).bits(), 0x03);
        assert_eq!(KindMask::from_bits(0xFF), KindMask::ALL);
        assert_eq!(KindMask::from(MemberKind::Field), KindMask::FIELD);
    }
}
