//! Sources for the paged data source: the member cache and collection values

use std::sync::Arc;

use spyglass_sdk::{TypeRegistry, Value};

use super::VirtualSource;
use crate::cache::{CacheEntry, CollectionEntry, Container, MemberDescriptor};
use crate::filter::{FilterEngine, FilteredView, MemberFilter};

/// The member cache seen through a filtered view
///
/// Descriptors are created once by the cache builder and live here for the
/// whole session; slots only hold indices into them.
#[derive(Debug)]
pub struct MemberSource {
    descriptors: Vec<MemberDescriptor>,
    view: FilteredView,
}

impl MemberSource {
    /// Source over every descriptor
    pub fn new(descriptors: Vec<MemberDescriptor>) -> Self {
        let view = FilteredView::all(descriptors.len());
        Self { descriptors, view }
    }

    /// Full descriptor array, in cache order
    pub fn descriptors(&self) -> &[MemberDescriptor] {
        &self.descriptors
    }

    /// Full descriptor array, mutably
    pub fn descriptors_mut(&mut self) -> &mut [MemberDescriptor] {
        &mut self.descriptors
    }

    /// Current filtered view
    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    /// Recompute the view for a filter
    pub fn refilter(&mut self, filter: &MemberFilter) {
        self.view = FilterEngine::filter(&self.descriptors, filter);
    }

    /// Swap in a rebuilt cache and refilter it
    pub fn replace(&mut self, descriptors: Vec<MemberDescriptor>, filter: &MemberFilter) {
        self.descriptors = descriptors;
        self.refilter(filter);
    }
}

impl VirtualSource for MemberSource {
    type Live = usize;

    fn item_count(&self) -> usize {
        self.view.len()
    }

    fn activate(&mut self, index: usize) -> Option<usize> {
        self.view.get(index)
    }

    fn resolve<'a>(&'a mut self, live: &'a mut usize) -> Option<&'a mut dyn CacheEntry> {
        self.descriptors
            .get_mut(*live)
            .map(|d| d as &mut dyn CacheEntry)
    }
}

/// Elements of an evaluated list or dictionary
///
/// Holds the container weakly and creates a [`CollectionEntry`] only for
/// positions bound to a slot. When the container goes away the source
/// becomes empty.
#[derive(Debug, Clone)]
pub struct CollectionSource {
    registry: Arc<TypeRegistry>,
    container: Container,
}

impl CollectionSource {
    /// Source over a `List` or `Dict` value
    pub fn from_value(registry: Arc<TypeRegistry>, value: &Value) -> Option<Self> {
        Some(Self {
            registry,
            container: Container::from_value(value)?,
        })
    }

    /// Whether entries are key/value pairs
    pub fn is_dictionary(&self) -> bool {
        self.container.is_dictionary()
    }

    /// Whether the container still exists
    pub fn is_attached(&self) -> bool {
        self.container.is_attached()
    }
}

impl VirtualSource for CollectionSource {
    type Live = CollectionEntry;

    fn item_count(&self) -> usize {
        self.container.len()
    }

    fn activate(&mut self, index: usize) -> Option<CollectionEntry> {
        let registry = Arc::clone(&self.registry);
        match &self.container {
            Container::List(weak) => {
                let list = weak.upgrade()?;
                Some(CollectionEntry::element(registry, &list, index))
            }
            Container::Dict(weak) => {
                let dict = weak.upgrade()?;
                Some(CollectionEntry::dict_entry(registry, &dict, index))
            }
        }
    }

    fn resolve<'a>(&'a mut self, live: &'a mut CollectionEntry) -> Option<&'a mut dyn CacheEntry> {
        Some(live)
    }
}
