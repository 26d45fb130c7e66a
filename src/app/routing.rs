//! Event routing
//!
//! Native events arrive addressed to a top-level window. Routing runs the
//! global filters, resolves the target window inside that top-level window
//! and hands the event to the target's dispatcher.

use tracing::{debug, trace, warn};

use crate::app::Context;
use crate::domain::geometry::{Point, Rect};
use crate::domain::native::{FromNative, NativePoint, NativeRect, ToNative};
use crate::event::{Dispatch, Dispatcher, Event, EventContext, EventKind, EventMask, NativeEvent};
use crate::input::FilterChain;
use crate::ui::Graphics;
use crate::window::{WindowId, WindowState};

impl Context {
    /// Offers `event` to the handlers of `id`
    ///
    /// Returns true if at least one handler ran. A nested dispatch of a kind
    /// that `id` is already handling is rejected and returns false.
    pub fn handle_event(&mut self, id: WindowId, event: &Event) -> bool {
        self.dispatch_to(id, event).handled()
    }

    pub(crate) fn dispatch_to(&mut self, id: WindowId, event: &Event) -> Dispatch {
        let kind = event.kind();
        let event_ctx = EventContext::new(id, self.scale, self.surface_position(id));
        let Some(node) = self.windows.get_mut(id) else {
            return Dispatch::default();
        };
        if !node.dispatcher.begin(kind) {
            warn!(target: "guipp::dispatch", ?kind, window = ?id, "re-entrant dispatch rejected");
            return Dispatch::default();
        }
        node.dispatch_depth += 1;
        node.state.insert(WindowState::IN_EVENT_HANDLE);
        let entries = node.dispatcher.matching(event);

        let outcome = Dispatcher::invoke(&entries, self, event, &event_ctx);

        if let Some(node) = self.windows.get_mut(id) {
            node.dispatcher.end(kind);
            node.dispatch_depth = node.dispatch_depth.saturating_sub(1);
            if node.dispatch_depth == 0 {
                node.state.remove(WindowState::IN_EVENT_HANDLE);
            }
        }
        outcome
    }

    /// Dispatch markers of every window, for [`restore_dispatch_state`](Self::restore_dispatch_state)
    pub(crate) fn dispatch_state(&self) -> Vec<(WindowId, EventMask, u32)> {
        self.windows
            .iter()
            .map(|(id, node)| (id, node.dispatcher.in_progress_mask(), node.dispatch_depth))
            .collect()
    }

    /// Rolls the dispatch markers back after a handler unwound
    ///
    /// Dispatches that were already running when `saved` was taken keep
    /// their markers; windows created since then have none.
    pub(crate) fn restore_dispatch_state(&mut self, saved: &[(WindowId, EventMask, u32)]) {
        for (_, node) in self.windows.iter_mut() {
            node.dispatcher.restore_in_progress(EventMask::EMPTY);
            node.dispatch_depth = 0;
            node.state.remove(WindowState::IN_EVENT_HANDLE);
        }
        for &(id, mask, depth) in saved {
            let Some(node) = self.windows.get_mut(id) else {
                continue;
            };
            node.dispatcher.restore_in_progress(mask);
            node.dispatch_depth = depth;
            node.state.set(WindowState::IN_EVENT_HANDLE, depth > 0);
        }
    }

    /// Routes one event from the backend
    pub(crate) fn route_native(&mut self, native: &NativeEvent) {
        if self.apply_filters(native) {
            trace!(target: "guipp::run_loop", kind = ?native.event.kind(), "claimed by filter");
            return;
        }
        let Some(handle) = native.window else {
            trace!(target: "guipp::run_loop", kind = ?native.event.kind(), "unbound event dropped");
            return;
        };
        let Some(top) = self.window_for_handle(handle) else {
            trace!(target: "guipp::run_loop", ?handle, "event for unknown native window");
            return;
        };

        let event = &native.event;
        let kind = event.kind();
        if (kind.is_mouse() || kind.is_key()) && self.blocked_by_modal(top) {
            trace!(target: "guipp::run_loop", ?kind, window = ?top, "input blocked by modal window");
            return;
        }

        match kind {
            EventKind::Paint => {
                if let Some(dirty) = event.native_rect() {
                    self.paint_native(top, dirty);
                }
            }
            EventKind::Size => {
                let area = Rect::from_parts(self.position(top), event.rect(self.scale).size());
                self.update_area(top, area, false, false);
            }
            EventKind::Move => {
                let area = Rect::from_parts(event.rect(self.scale).position(), self.size(top));
                self.update_area(top, area, false, false);
            }
            EventKind::MouseMove
            | EventKind::ButtonDown
            | EventKind::ButtonUp
            | EventKind::ButtonDoubleClick
            | EventKind::Wheel => self.route_mouse(top, event),
            EventKind::MouseLeave => self.set_mouse_inside(None),
            EventKind::KeyDown | EventKind::KeyUp => self.route_key(top, event),
            EventKind::Close => {
                let modal = self.modal_stack.contains(&top);
                if self.close(top) && !modal {
                    debug!(target: "guipp::run_loop", window = ?top, "close not consumed, stopping");
                    self.quit_main_loop();
                }
            }
            EventKind::ScaleChanged => {
                if let Some(factor) = event.scale_factor() {
                    self.set_scale_factor(factor);
                }
            }
            _ => {
                self.handle_event(top, event);
            }
        }
    }

    /// Hot keys first, then registered filters in order
    fn apply_filters(&mut self, native: &NativeEvent) -> bool {
        if self.fire_hot_key(native) {
            return true;
        }
        if self.filters.is_empty() {
            return false;
        }
        let filters = self.filters.snapshot();
        FilterChain::apply(&filters, self, native)
    }

    fn fire_hot_key(&mut self, native: &NativeEvent) -> bool {
        let event = &native.event;
        if !matches!(event.kind(), EventKind::KeyDown | EventKind::HotKey) {
            return false;
        }
        let Some((key, binding)) = self.hot_keys.lookup(event.key_symbol(), event.key_state()) else {
            return false;
        };
        if let (Some(bound), Some(handle)) = (binding.window, native.window) {
            let target = self.window_for_handle(handle);
            if target.is_none() || self.top_level(bound) != target {
                return false;
            }
        }

        let Ok(mut callback) = binding.callback.try_borrow_mut() else {
            warn!(target: "guipp::hotkey", %key, "hot key callback is already running");
            return true;
        };
        debug!(target: "guipp::hotkey", %key, "hot key fired");
        (*callback)(self);
        true
    }

    fn blocked_by_modal(&self, top: WindowId) -> bool {
        self.modal_stack.last().is_some_and(|modal| *modal != top)
    }

    fn route_mouse(&mut self, top: WindowId, event: &Event) {
        let kind = event.kind();
        let at = event.surface_point(self.scale);
        let target = self.window_at(top, at).unwrap_or(top);

        if kind == EventKind::MouseMove {
            self.set_mouse_inside(Some(target));
        }
        if !self.windows.get(target).is_some_and(|node| node.is_enabled()) {
            return;
        }

        if kind == EventKind::ButtonDown {
            self.last_mouse_down = self.surface_to_client(target, event.native_point());
            if self.state(target).contains(WindowState::ACCEPT_FOCUS) {
                self.set_focus(target);
            }
        }

        let handled = self.handle_event(target, event);

        match kind {
            EventKind::ButtonUp => self.last_mouse_down = Point::UNDEFINED,
            EventKind::Wheel if !handled => {
                let mut current = self.parent(target);
                while let Some(window) = current {
                    if self.handle_event(window, event) {
                        break;
                    }
                    current = self.parent(window);
                }
            }
            _ => {}
        }
    }

    /// Delivers `MouseLeave` to the old window and `MouseEnter` to the new one
    fn set_mouse_inside(&mut self, window: Option<WindowId>) {
        if self.mouse_inside == window {
            return;
        }
        if let Some(old) = self.mouse_inside.take() {
            self.handle_event(old, &Event::simple(EventKind::MouseLeave));
        }
        self.mouse_inside = window;
        if let Some(new) = window {
            self.handle_event(new, &Event::simple(EventKind::MouseEnter));
        }
    }

    /// Focused window of `top`, or `top` itself
    fn route_key(&mut self, top: WindowId, event: &Event) {
        let target = match self.focus {
            Some(focus) if self.top_level(focus) == Some(top) => focus,
            _ => top,
        };
        if self.windows.get(target).is_some_and(|node| node.accepts_input()) {
            self.handle_event(target, event);
        }
    }

    /// Paints the dirty part of a top-level window and presents it
    ///
    /// `dirty` is clipped to the window's client bounds first.
    pub(crate) fn paint_native(&mut self, top: WindowId, dirty: NativeRect) {
        let Some(node) = self.windows.get(top) else {
            return;
        };
        let Some(handle) = node.native else {
            return;
        };
        let bounds = NativeRect::from_parts(NativePoint::ZERO, node.area.size().to_native(self.scale));
        let dirty = dirty.intersection(&bounds);
        let Some(graphics) = self.backend.begin_paint(handle, dirty, self.scale) else {
            trace!(target: "guipp::platform", window = ?top, ?dirty, "nothing to paint");
            return;
        };
        let event = Event::paint(dirty);
        let area = graphics.surface_area().to_logical(self.scale);
        self.paint_tree(top, &graphics, &event, area);
        self.backend.end_paint(handle, &graphics);
    }

    /// Background, then handlers, then children on top
    fn paint_tree(&mut self, id: WindowId, graphics: &Graphics, event: &Event, dirty: Rect) {
        let Some(node) = self.windows.get(id) else {
            return;
        };
        if !node.is_created() || !node.is_visible() {
            return;
        }
        let background = node.class.background;
        let children = node.children.clone();
        let area = self.surface_geometry(id);
        if !area.intersects(&dirty) {
            return;
        }

        let view = graphics.for_area(area);
        if let Some(color) = background {
            view.fill_rect(Rect::with_size(area.size()), color);
        }
        self.handle_event(id, &event.with_graphics(view));

        for child in children {
            self.paint_tree(child, graphics, event, dirty);
        }
    }
}
