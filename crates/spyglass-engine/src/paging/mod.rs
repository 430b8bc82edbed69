//! Paged virtual data source
//!
//! Maps a page of a logical item range onto a fixed number of slots. Only
//! the items bound to slots are live; everything else stays an index. A
//! source with a hundred thousand items and a capacity of fifty never has
//! more than fifty live items, whatever the page.
//!
//! Each slot can also hold a presentation resource (a row widget, a nested
//! inspector). Rebinding a slot returns its resource to an inactive pool
//! before the slot is associated with a new item, and the next item to need
//! one takes it from the pool.
//!
//! Observers subscribe with [`PagedVirtualDataSource::subscribe`] and get a
//! [`RebuildEvent`] every time the bound window changes.

mod sources;

pub use sources::{CollectionSource, MemberSource};

use crossbeam::channel::{self, Receiver, Sender};

use crate::cache::CacheEntry;

/// Items that can be paged
pub trait VirtualSource {
    /// What a slot holds while bound to an item
    type Live;

    /// Number of logical items
    fn item_count(&self) -> usize;

    /// Materialize the item at a logical position
    fn activate(&mut self, index: usize) -> Option<Self::Live>;

    /// Descriptor of a live item
    fn resolve<'a>(&'a mut self, live: &'a mut Self::Live) -> Option<&'a mut dyn CacheEntry>;
}

/// Visible range of logical positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    /// First logical position
    pub start: usize,
    /// Number of positions shown
    pub count: usize,
}

impl PageWindow {
    /// One past the last position
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    /// Whether a logical position is visible
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }
}

/// Sent to subscribers after every rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildEvent {
    /// Item count at rebuild time
    pub item_count: usize,
    /// Bound window
    pub window: PageWindow,
    /// The page was reset to 0 because it fell past the end
    pub reset: bool,
}

/// Inactive resources waiting to be reattached
#[derive(Debug)]
pub struct ResourcePool<R> {
    inactive: Vec<R>,
    created: usize,
}

impl<R> ResourcePool<R> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            inactive: Vec::new(),
            created: 0,
        }
    }

    /// Reuse an inactive resource, or make one
    pub fn acquire(&mut self, make: impl FnOnce() -> R) -> R {
        match self.inactive.pop() {
            Some(resource) => resource,
            None => {
                self.created += 1;
                make()
            }
        }
    }

    /// Return a resource
    pub fn release(&mut self, resource: R) {
        self.inactive.push(resource);
    }

    /// Resources waiting for reuse
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Resources ever made by this pool
    pub fn created(&self) -> usize {
        self.created
    }
}

impl<R> Default for ResourcePool<R> {
    fn default() -> Self {
        Self::new()
    }
}

struct Slot<L, R> {
    index: usize,
    live: L,
    resource: Option<R>,
}

/// Bounded window over a [`VirtualSource`]
pub struct PagedVirtualDataSource<S: VirtualSource, R = ()> {
    source: S,
    capacity: usize,
    start: usize,
    slots: Vec<Option<Slot<S::Live, R>>>,
    pool: ResourcePool<R>,
    subscribers: Vec<Sender<RebuildEvent>>,
    peak_live: usize,
}

impl<S: VirtualSource, R> PagedVirtualDataSource<S, R> {
    /// Create a data source showing page 0
    ///
    /// A capacity of 0 is treated as 1.
    pub fn new(source: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let mut data = Self {
            source,
            capacity,
            start: 0,
            slots,
            pool: ResourcePool::new(),
            subscribers: Vec::new(),
            peak_live: 0,
        };
        data.rebuild();
        data
    }

    /// Number of logical items
    pub fn item_count(&self) -> usize {
        self.source.item_count()
    }

    /// Slots per page
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages (0 when there are no items)
    pub fn page_count(&self) -> usize {
        self.item_count().div_ceil(self.capacity)
    }

    /// Current page index
    pub fn current_page(&self) -> usize {
        self.start / self.capacity
    }

    /// Visible range
    pub fn window(&self) -> PageWindow {
        let count = self.item_count().saturating_sub(self.start).min(self.capacity);
        PageWindow {
            start: self.start,
            count,
        }
    }

    /// Show a page; past the end goes back to page 0
    pub fn set_page(&mut self, page: usize) -> RebuildEvent {
        let start = page.saturating_mul(self.capacity);
        let reset = start > 0 && start >= self.item_count();
        if reset {
            tracing::debug!(page, items = self.item_count(), "page out of range, showing page 0");
        }
        self.start = if reset { 0 } else { start };
        let event = self.rebuild();
        RebuildEvent {
            reset: event.reset || reset,
            ..event
        }
    }

    /// Show the next page, wrapping to the first
    pub fn next_page(&mut self) -> RebuildEvent {
        let next = self.current_page() + 1;
        if next < self.page_count() {
            self.set_page(next)
        } else {
            self.set_page(0)
        }
    }

    /// Show the previous page, stopping at the first
    pub fn previous_page(&mut self) -> RebuildEvent {
        self.set_page(self.current_page().saturating_sub(1))
    }

    /// Rebind every slot to the current window and notify subscribers
    ///
    /// If the item count shrank below the window start, the page resets to 0.
    pub fn rebuild(&mut self) -> RebuildEvent {
        let reset = self.start > 0 && self.start >= self.item_count();
        if reset {
            tracing::debug!(
                start = self.start,
                items = self.item_count(),
                "item count shrank below window, showing page 0"
            );
            self.start = 0;
        }

        for slot in self.slots.iter_mut() {
            if let Some(old) = slot.take() {
                if let Some(resource) = old.resource {
                    self.pool.release(resource);
                }
            }
        }

        let window = self.window();
        for (offset, slot) in self.slots.iter_mut().enumerate().take(window.count) {
            let index = window.start + offset;
            *slot = self.source.activate(index).map(|live| Slot {
                index,
                live,
                resource: None,
            });
        }
        self.peak_live = self.peak_live.max(self.live_count());

        let event = RebuildEvent {
            item_count: self.item_count(),
            window,
            reset,
        };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
        tracing::trace!(start = window.start, count = window.count, "window rebuilt");
        event
    }

    /// Change the source, then rebuild
    pub fn update_source(&mut self, change: impl FnOnce(&mut S)) -> RebuildEvent {
        change(&mut self.source);
        self.rebuild()
    }

    /// Subscribe to rebuild notifications
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<RebuildEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Logical position bound to a slot
    pub fn slot_index(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot)?.as_ref().map(|s| s.index)
    }

    /// Descriptor bound to a slot
    pub fn slot_entry(&mut self, slot: usize) -> Option<&mut dyn CacheEntry> {
        let bound = self.slots.get_mut(slot)?.as_mut()?;
        self.source.resolve(&mut bound.live)
    }

    /// Resource attached to a slot
    pub fn resource(&self, slot: usize) -> Option<&R> {
        self.slots.get(slot)?.as_ref()?.resource.as_ref()
    }

    /// Attach a resource to a bound slot, reusing an inactive one if possible
    pub fn attach(&mut self, slot: usize, make: impl FnOnce() -> R) -> Option<&mut R> {
        let bound = self.slots.get_mut(slot)?.as_mut()?;
        if bound.resource.is_none() {
            bound.resource = Some(self.pool.acquire(make));
        }
        bound.resource.as_mut()
    }

    /// Number of bound slots
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Highest number of slots ever bound at once
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    /// Inactive resource pool
    pub fn pool(&self) -> &ResourcePool<R> {
        &self.pool
    }

    /// The paged source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The paged source, mutably
    ///
    /// Changes to the item set are picked up by the next [`Self::rebuild`];
    /// prefer [`Self::update_source`].
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvalState;
    use crate::classify::ValueKind;
    use crate::error::WriteFault;
    use spyglass_sdk::{TypeId, TypeRegistry, Value};
    use std::sync::Arc;

    /// Counts activations; entries are plain numbers
    struct Numbers {
        registry: Arc<TypeRegistry>,
        count: usize,
        activated: usize,
    }

    struct Number {
        registry: Arc<TypeRegistry>,
        label: String,
        value: i64,
        state: EvalState,
    }

    impl CacheEntry for Number {
        fn label(&self) -> &str {
            &self.label
        }
        fn registry(&self) -> &TypeRegistry {
            &self.registry
        }
        fn declared_type(&self) -> Option<TypeId> {
            Some(TypeId::INT)
        }
        fn state(&self) -> &EvalState {
            &self.state
        }
        fn evaluate(&mut self) -> ValueKind {
            self.state = EvalState::Evaluated(Value::Int(self.value));
            ValueKind::Number
        }
        fn can_write(&self) -> bool {
            false
        }
        fn set_value(&mut self, _: Value) -> Result<(), WriteFault> {
            Err(WriteFault::NotWritable(self.label.clone()))
        }
        fn invalidate(&mut self) {
            self.state = EvalState::NotEvaluated;
        }
    }

    impl VirtualSource for Numbers {
        type Live = Number;

        fn item_count(&self) -> usize {
            self.count
        }

        fn activate(&mut self, index: usize) -> Option<Number> {
            self.activated += 1;
            Some(Number {
                registry: Arc::clone(&self.registry),
                label: format!("[{}]", index),
                value: index as i64,
                state: EvalState::NotEvaluated,
            })
        }

        fn resolve<'a>(&'a mut self, live: &'a mut Number) -> Option<&'a mut dyn CacheEntry> {
            Some(live)
        }
    }

    fn numbers(count: usize) -> Numbers {
        Numbers {
            registry: Arc::new(TypeRegistry::new()),
            count,
            activated: 0,
        }
    }

    #[test]
    fn test_live_items_bounded_by_capacity() {
        let mut data = PagedVirtualDataSource::<_, ()>::new(numbers(100_000), 50);
        assert_eq!(data.item_count(), 100_000);
        assert_eq!(data.page_count(), 2_000);

        for page in [1, 7, 1_999, 500] {
            data.set_page(page);
            assert_eq!(data.live_count(), 50);
        }
        assert_eq!(data.peak_live(), 50);
        assert_eq!(data.source().activated, 5 * 50);
        assert_eq!(data.slot_index(0), Some(500 * 50));
    }

    #[test]
    fn test_page_past_end_resets() {
        let mut data = PagedVirtualDataSource::<_, ()>::new(numbers(30), 10);
        let event = data.set_page(3);
        assert!(event.reset);
        assert_eq!(data.current_page(), 0);

        data.set_page(2);
        assert_eq!(data.window(), PageWindow { start: 20, count: 10 });
        assert_eq!(data.next_page().window.start, 0);
        assert_eq!(data.previous_page().window.start, 0);
    }

    #[test]
    fn test_shrinking_source_resets_and_notifies() {
        let mut data = PagedVirtualDataSource::<_, ()>::new(numbers(100), 10);
        let rx = data.subscribe();
        data.set_page(5);
        assert_eq!(rx.try_recv().unwrap().window.start, 50);

        let event = data.update_source(|s| s.count = 12);
        assert!(event.reset);
        assert_eq!(rx.try_recv().unwrap(), event);
        assert_eq!(data.window(), PageWindow { start: 0, count: 10 });

        data.set_page(1);
        assert_eq!(data.window(), PageWindow { start: 10, count: 2 });
        assert_eq!(data.live_count(), 2);
        assert!(data.slot_entry(2).is_none());
    }

    #[test]
    fn test_slot_entries_evaluate_on_demand() {
        let mut data = PagedVirtualDataSource::<_, ()>::new(numbers(40), 10);
        data.set_page(2);
        let entry = data.slot_entry(3).unwrap();
        assert!(entry.state().is_not_evaluated());
        assert_eq!(entry.evaluate(), ValueKind::Number);
        assert_eq!(entry.state().value(), Some(&Value::Int(23)));
        assert_eq!(entry.label(), "[23]");
    }

    #[test]
    fn test_resources_return_to_pool_on_rebind() {
        let mut data = PagedVirtualDataSource::<_, String>::new(numbers(40), 4);
        for slot in 0..4 {
            data.attach(slot, || format!("widget {}", slot));
        }
        assert_eq!(data.pool().created(), 4);

        data.next_page();
        assert_eq!(data.pool().inactive_count(), 4);
        assert!(data.resource(0).is_none());

        data.attach(0, || "fresh".to_string());
        assert_eq!(data.pool().created(), 4);
        assert_eq!(data.pool().inactive_count(), 3);
        assert!(data.resource(0).is_some_and(|w| w.starts_with("widget")));
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let mut data = PagedVirtualDataSource::<_, ()>::new(numbers(10), 5);
        let rx = data.subscribe();
        drop(rx);
        data.rebuild();
        assert!(data.subscribers.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let mut data = PagedVirtualDataSource::<_, ()>::new(numbers(0), 5);
        assert_eq!(data.page_count(), 0);
        assert_eq!(data.live_count(), 0);
        assert!(!data.next_page().reset);
        assert_eq!(data.window(), PageWindow::default());
    }
}
