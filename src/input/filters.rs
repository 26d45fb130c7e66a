//! Global event filters
//!
//! Filters see every native event before it is routed to a window, in
//! registration order. The first filter that returns `true` claims the event
//! and nothing else sees it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::NativeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(u64);

pub type EventFilter<T> = Box<dyn FnMut(&mut T, &NativeEvent) -> bool>;

pub struct FilterChain<T> {
    filters: Vec<(FilterId, Rc<RefCell<EventFilter<T>>>)>,
    next_id: u64,
}

impl<T> Default for FilterChain<T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> FilterChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: EventFilter<T>) -> FilterId {
        let id = FilterId(self.next_id);
        self.next_id += 1;
        self.filters.push((id, Rc::new(RefCell::new(filter))));
        id
    }

    pub fn remove(&mut self, id: FilterId) -> bool {
        let before = self.filters.len();
        self.filters.retain(|(filter_id, _)| *filter_id != id);
        self.filters.len() != before
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Current filters, so they can run while the owner is borrowed mutably
    pub fn snapshot(&self) -> Vec<Rc<RefCell<EventFilter<T>>>> {
        self.filters.iter().map(|(_, filter)| Rc::clone(filter)).collect()
    }

    /// Runs `filters` until one claims `event`
    ///
    /// A filter that is already running further up the stack is skipped.
    pub fn apply(filters: &[Rc<RefCell<EventFilter<T>>>], target: &mut T, event: &NativeEvent) -> bool {
        filters.iter().any(|filter| match filter.try_borrow_mut() {
            Ok(mut filter) => (*filter)(target, event),
            Err(_) => false,
        })
    }
}

impl<T> fmt::Debug for FilterChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}
