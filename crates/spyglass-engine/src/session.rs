//! Inspection sessions
//!
//! An [`InspectorSession`] owns everything one inspection needs: the target,
//! the member cache, the active filter and the paged window over it. It is
//! driven by the host's per-frame [`InspectorSession::tick`]; nothing runs in
//! the background and every evaluation completes within the call that asks
//! for it.
//!
//! Sessions are not shared. Two sessions over the same target each build
//! their own cache.

use std::sync::Arc;

use crossbeam::channel::Receiver;
use spyglass_sdk::{TypeRegistry, Value};

use crate::cache::{CacheEntry, MemberCacheBuilder, MemberDescriptor};
use crate::classify::{Interaction, ValueKind};
use crate::config::InspectorConfig;
use crate::error::{InspectError, WriteFault};
use crate::filter::{FilteredView, KindMask, MemberFilter};
use crate::format;
use crate::paging::{
    CollectionSource, MemberSource, PageWindow, PagedVirtualDataSource, RebuildEvent,
};
use crate::reflect::Scope;
use crate::target::TargetHandle;

/// One inspection of one target
pub struct InspectorSession {
    registry: Arc<TypeRegistry>,
    target: TargetHandle,
    config: InspectorConfig,
    scope: Scope,
    builder: MemberCacheBuilder,
    filter: MemberFilter,
    data: PagedVirtualDataSource<MemberSource>,
    auto_update: bool,
}

impl InspectorSession {
    /// Build the member cache for `target` and show its first page
    pub fn open(
        registry: Arc<TypeRegistry>,
        target: TargetHandle,
        config: InspectorConfig,
    ) -> Result<Self, InspectError> {
        Self::open_with_scope(registry, target, config, Scope::All)
    }

    /// Like [`Self::open`], caching only members in `scope`
    pub fn open_with_scope(
        registry: Arc<TypeRegistry>,
        target: TargetHandle,
        config: InspectorConfig,
        scope: Scope,
    ) -> Result<Self, InspectError> {
        let builder = MemberCacheBuilder::with_config(Arc::clone(&registry), &config);
        let descriptors = builder.build(&target, scope)?;
        tracing::debug!(
            target_type = %registry.name_of(target.declared_type()),
            members = descriptors.len(),
            "inspector session opened"
        );

        let data = PagedVirtualDataSource::new(MemberSource::new(descriptors), config.page_size);
        Ok(Self {
            auto_update: config.auto_update,
            registry,
            target,
            config,
            scope,
            builder,
            filter: MemberFilter::new(),
            data,
        })
    }

    /// Inspected target
    pub fn target(&self) -> &TargetHandle {
        &self.target
    }

    /// Session settings
    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Type registry
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Scope the cache was built for
    pub fn scope(&self) -> Scope {
        self.scope
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Full descriptor array, in cache order
    pub fn descriptors(&self) -> &[MemberDescriptor] {
        self.data.source().descriptors()
    }

    /// Descriptor at a cache index
    pub fn descriptor(&self, index: usize) -> Option<&MemberDescriptor> {
        self.descriptors().get(index)
    }

    /// Descriptor at a cache index, mutably (to supply arguments)
    pub fn descriptor_mut(&mut self, index: usize) -> Option<&mut MemberDescriptor> {
        self.data.source_mut().descriptors_mut().get_mut(index)
    }

    /// Cache index of the first descriptor with this signature
    pub fn find(&self, signature: &str) -> Option<usize> {
        self.descriptors().iter().position(|d| d.signature() == signature)
    }

    /// Rebuild the member cache from scratch
    ///
    /// Every descriptor starts over as `NotEvaluated`; the filter is kept.
    pub fn rebuild_cache(&mut self) -> Result<RebuildEvent, InspectError> {
        let descriptors = self.builder.build(&self.target, self.scope)?;
        let filter = &self.filter;
        Ok(self.data.update_source(|source| source.replace(descriptors, filter)))
    }

    /// Return every descriptor to `NotEvaluated`
    pub fn invalidate_all(&mut self) {
        for descriptor in self.data.source_mut().descriptors_mut() {
            descriptor.invalidate();
        }
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Active filter
    pub fn filter(&self) -> &MemberFilter {
        &self.filter
    }

    /// Indices of the descriptors passing the filter
    pub fn filtered(&self) -> &FilteredView {
        self.data.source().view()
    }

    /// Replace the whole filter
    pub fn set_filter(&mut self, filter: MemberFilter) -> RebuildEvent {
        self.filter = filter;
        self.refilter()
    }

    /// Case-insensitive name substring; empty clears it
    pub fn set_name_filter(&mut self, needle: &str) -> RebuildEvent {
        self.filter.set_name(needle);
        self.refilter()
    }

    /// Member kinds to show
    pub fn set_kind_filter(&mut self, kinds: KindMask) -> RebuildEvent {
        self.filter.kinds = kinds;
        self.refilter()
    }

    /// Static, instance or both
    pub fn set_scope_filter(&mut self, scope: Scope) -> RebuildEvent {
        self.filter.scope = scope;
        self.refilter()
    }

    fn refilter(&mut self) -> RebuildEvent {
        let filter = &self.filter;
        self.data.update_source(|source| source.refilter(filter))
    }

    // ========================================================================
    // Paging
    // ========================================================================

    /// Number of descriptors passing the filter
    pub fn item_count(&self) -> usize {
        self.data.item_count()
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.data.page_count()
    }

    /// Current page
    pub fn current_page(&self) -> usize {
        self.data.current_page()
    }

    /// Show a page; past the end goes back to page 0
    pub fn set_page(&mut self, page: usize) -> RebuildEvent {
        self.data.set_page(page)
    }

    /// Show the next page, wrapping to the first
    pub fn next_page(&mut self) -> RebuildEvent {
        self.data.next_page()
    }

    /// Show the previous page
    pub fn previous_page(&mut self) -> RebuildEvent {
        self.data.previous_page()
    }

    /// Visible range of the filtered view
    pub fn window(&self) -> PageWindow {
        self.data.window()
    }

    /// Cache indices of the visible descriptors, in cache order
    pub fn visible(&self) -> &[usize] {
        let window = self.data.window();
        self.filtered()
            .as_slice()
            .get(window.start..window.end())
            .unwrap_or(&[])
    }

    /// Descriptor bound to a view slot
    pub fn slot_entry(&mut self, slot: usize) -> Option<&mut dyn CacheEntry> {
        self.data.slot_entry(slot)
    }

    /// Subscribe to window rebuilds
    pub fn subscribe(&mut self) -> Receiver<RebuildEvent> {
        self.data.subscribe()
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Per-frame update
    ///
    /// Evaluates visible members that have never been evaluated (if
    /// auto-evaluation is on), then, with auto-update on, re-reads every
    /// visible member. Returns the number of evaluations performed.
    pub fn tick(&mut self) -> usize {
        let mut evaluated = 0;
        if self.config.auto_evaluate {
            evaluated += self.evaluate_visible(|d| d.state().is_not_evaluated());
        }
        if self.auto_update {
            evaluated += self.evaluate_visible(|d| !d.state().is_not_evaluated());
        }
        evaluated
    }

    /// Re-read every visible member that can be evaluated without arguments
    pub fn update_values(&mut self) -> usize {
        self.evaluate_visible(|_| true)
    }

    /// Turn per-tick re-evaluation on or off
    pub fn set_auto_update(&mut self, enabled: bool) {
        self.auto_update = enabled;
    }

    /// Whether per-tick re-evaluation is on
    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Evaluate one member, whatever its kind
    pub fn evaluate(&mut self, index: usize) -> Option<ValueKind> {
        self.descriptor_mut(index).map(MemberDescriptor::evaluate)
    }

    fn evaluate_visible(&mut self, wanted: impl Fn(&MemberDescriptor) -> bool) -> usize {
        let visible = self.visible().to_vec();
        let descriptors = self.data.source_mut().descriptors_mut();
        let mut count = 0;
        for index in visible {
            let Some(descriptor) = descriptors.get_mut(index) else {
                continue;
            };
            if descriptor.auto_evaluates() && wanted(descriptor) {
                descriptor.evaluate();
                count += 1;
            }
        }
        if count > 0 {
            tracing::trace!(count, "evaluated visible members");
        }
        count
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write a member's value, then re-read it
    pub fn set_value(&mut self, index: usize, value: Value) -> Result<(), WriteFault> {
        self.descriptor_mut(index)
            .ok_or(WriteFault::UnknownMember(index))?
            .set_value(value)
    }

    /// Parse text against a member's type and write it
    pub fn set_value_text(&mut self, index: usize, text: &str) -> Result<(), WriteFault> {
        self.descriptor_mut(index)
            .ok_or(WriteFault::UnknownMember(index))?
            .set_value_text(text)
    }

    // ========================================================================
    // Presentation helpers
    // ========================================================================

    /// One-line preview of a member's state
    pub fn preview(&self, index: usize) -> Option<String> {
        let descriptor = self.descriptor(index)?;
        Some(format::describe(
            descriptor.state(),
            Some(descriptor.value_type()),
            &self.registry,
            self.config.preview_length,
        ))
    }

    /// What can be done with a member's current value
    pub fn interaction(&self, index: usize) -> Option<Interaction> {
        self.descriptor(index)
            .map(|d| Interaction::for_value(d.value_kind(), d.state().value()))
    }

    /// Open a nested session over an evaluated object or struct value
    pub fn inspect_value(&self, index: usize) -> Result<InspectorSession, InspectError> {
        let value = self.evaluated_value(index)?;
        let target = TargetHandle::instance(&self.registry, value)?;
        InspectorSession::open(Arc::clone(&self.registry), target, self.config.clone())
    }

    /// Paged view over an evaluated list or dictionary value
    pub fn collection_view(
        &self,
        index: usize,
    ) -> Result<PagedVirtualDataSource<CollectionSource>, InspectError> {
        let value = self.evaluated_value(index)?;
        let source =
            CollectionSource::from_value(Arc::clone(&self.registry), value).ok_or_else(|| {
                InspectError::InvalidTarget(format!("{} is not a collection", value.type_name()))
            })?;
        Ok(PagedVirtualDataSource::new(source, self.config.page_size))
    }

    fn evaluated_value(&self, index: usize) -> Result<&Value, InspectError> {
        let descriptor = self
            .descriptor(index)
            .ok_or_else(|| InspectError::InvalidTarget(format!("no member at index {}", index)))?;
        descriptor.state().value().ok_or_else(|| {
            InspectError::InvalidTarget(format!("{} is not evaluated", descriptor.signature()))
        })
    }
}

impl std::fmt::Debug for InspectorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectorSession")
            .field("target", &self.target)
            .field("scope", &self.scope)
            .field("members", &self.descriptors().len())
            .field("filter", &self.filter)
            .field("window", &self.window())
            .finish_non_exhaustive()
    }
}
