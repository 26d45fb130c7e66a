//! Per-window handler registry
//!
//! Handlers are offered an event in registration order. Notification kinds
//! reach every matching handler; a handler whose descriptor consumes stops
//! the walk once it has run.
//!
//! The dispatcher is generic over the value handlers mutate. The toolkit
//! instantiates it with [`Context`](crate::app::Context) so that handlers can
//! create, move and destroy windows while the event is being delivered.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::event::handler::{EventContext, EventSpec};
use crate::event::{Event, EventKind, EventMask};

/// Identifies one registration within a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Returns whether the handler actually ran
type Callback<T> = dyn FnMut(&mut T, &Event, &EventContext) -> bool;
type Matcher = dyn Fn(&Event) -> bool;

/// One registered handler
pub struct HandlerEntry<T> {
    id: HandlerId,
    mask: EventMask,
    consumes: bool,
    matcher: Box<Matcher>,
    callback: RefCell<Box<Callback<T>>>,
}

impl<T> HandlerEntry<T> {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.mask.contains(event.kind()) && (self.matcher)(event)
    }
}

/// Outcome of offering one event to a handler list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// Handlers that ran
    pub matched: usize,
    /// A consuming handler ran and cut the walk short
    pub consumed: bool,
}

impl Dispatch {
    pub fn handled(&self) -> bool {
        self.matched > 0
    }
}

pub struct Dispatcher<T> {
    entries: Vec<Rc<HandlerEntry<T>>>,
    mask: EventMask,
    in_progress: Cell<EventMask>,
    next_id: u64,
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            mask: EventMask::EMPTY,
            in_progress: Cell::new(EventMask::EMPTY),
            next_id: 1,
        }
    }
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a typed handler for descriptor `S`
    pub fn register<S, F>(&mut self, mut handler: F) -> HandlerId
    where
        T: 'static,
        S: EventSpec,
        F: FnMut(&mut T, S::Args) + 'static,
    {
        self.register_raw(
            S::MASK,
            S::CONSUMES,
            Box::new(S::matches),
            Box::new(move |target: &mut T, event: &Event, ctx: &EventContext| {
                match S::extract(event, ctx) {
                    Some(args) => {
                        handler(target, args);
                        true
                    }
                    None => false,
                }
            }),
        )
    }

    /// Like [`register`](Self::register) with an extra predicate, for
    /// matches such as a specific key and modifier combination
    pub fn register_filtered<S, P, F>(&mut self, filter: P, mut handler: F) -> HandlerId
    where
        T: 'static,
        S: EventSpec,
        P: Fn(&Event) -> bool + 'static,
        F: FnMut(&mut T, S::Args) + 'static,
    {
        self.register_raw(
            S::MASK,
            S::CONSUMES,
            Box::new(move |event: &Event| S::matches(event) && filter(event)),
            Box::new(move |target: &mut T, event: &Event, ctx: &EventContext| {
                match S::extract(event, ctx) {
                    Some(args) => {
                        handler(target, args);
                        true
                    }
                    None => false,
                }
            }),
        )
    }

    /// Untyped registration; `mask` is unioned into the active mask
    ///
    /// `callback` returns false when it declined the event; declined calls
    /// neither count as handled nor consume.
    pub fn register_raw(
        &mut self,
        mask: EventMask,
        consumes: bool,
        matcher: Box<Matcher>,
        callback: Box<Callback<T>>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.mask |= mask;
        self.entries.push(Rc::new(HandlerEntry {
            id,
            mask,
            consumes,
            matcher,
            callback: RefCell::new(callback),
        }));
        id
    }

    /// Removes a registration; returns false if `id` is unknown
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return false;
        }
        self.mask = self
            .entries
            .iter()
            .fold(EventMask::EMPTY, |mask, entry| mask | entry.mask);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.mask = EventMask::EMPTY;
    }

    /// Union of every registered handler's kinds
    pub fn mask(&self) -> EventMask {
        self.mask
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks `kind` as being dispatched; false if it already is
    pub fn begin(&self, kind: EventKind) -> bool {
        let mut active = self.in_progress.get();
        if active.contains(kind) {
            return false;
        }
        active.insert(kind);
        self.in_progress.set(active);
        true
    }

    pub fn end(&self, kind: EventKind) {
        let mut active = self.in_progress.get();
        active.remove(kind);
        self.in_progress.set(active);
    }

    pub fn in_progress(&self, kind: EventKind) -> bool {
        self.in_progress.get().contains(kind)
    }

    /// Kinds currently being dispatched
    pub fn in_progress_mask(&self) -> EventMask {
        self.in_progress.get()
    }

    /// Puts the in-progress markers back to an earlier
    /// [`in_progress_mask`](Self::in_progress_mask) after an unwound handler
    pub fn restore_in_progress(&self, mask: EventMask) {
        self.in_progress.set(mask);
    }

    /// Handlers that match `event`, in registration order
    ///
    /// The snapshot keeps the handlers alive while they run, even if one of
    /// them unregisters itself or destroys the window.
    pub fn matching(&self, event: &Event) -> Vec<Rc<HandlerEntry<T>>> {
        if !self.mask.contains(event.kind()) {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.matches(event))
            .cloned()
            .collect()
    }

    /// Runs a snapshot taken by [`matching`](Self::matching)
    pub fn invoke(
        entries: &[Rc<HandlerEntry<T>>],
        target: &mut T,
        event: &Event,
        ctx: &EventContext,
    ) -> Dispatch {
        let mut outcome = Dispatch::default();
        for entry in entries {
            let Ok(mut callback) = entry.callback.try_borrow_mut() else {
                tracing::warn!(
                    target: "guipp::dispatch",
                    kind = ?event.kind(),
                    handler = ?entry.id,
                    "handler is already running, skipped"
                );
                continue;
            };
            if !(*callback)(target, event, ctx) {
                continue;
            }
            outcome.matched += 1;
            if entry.consumes {
                outcome.consumed = true;
                break;
            }
        }
        outcome
    }

    /// Offers `event` to every matching handler
    ///
    /// Returns true if at least one handler ran. A nested call for a kind
    /// that is already being dispatched returns false without running
    /// anything.
    pub fn handle_event(&self, target: &mut T, event: &Event, ctx: &EventContext) -> bool {
        self.dispatch(target, event, ctx).handled()
    }

    pub fn dispatch(&self, target: &mut T, event: &Event, ctx: &EventContext) -> Dispatch {
        let kind = event.kind();
        if !self.begin(kind) {
            tracing::warn!(
                target: "guipp::dispatch",
                ?kind,
                window = ?ctx.window,
                "re-entrant dispatch rejected"
            );
            return Dispatch::default();
        }
        let entries = self.matching(event);
        let outcome = Self::invoke(&entries, target, event, ctx);
        self.end(kind);
        outcome
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.entries.len())
            .field("mask", &self.mask)
            .field("in_progress", &self.in_progress.get())
            .finish()
    }
}
