//! In-memory backend
//!
//! Windows are records in a map, paints are rendered into tiny-skia pixmaps
//! and kept as the last presented frame, and input arrives through a
//! [`HeadlessHandle`] that shares the backend's state.
//!
//! Invalidations coalesce per window into one pending paint. Painting part
//! of a window settles the pending paint only when it covers all of it. A
//! pending paint is only turned into a `Paint` event once the input queue is
//! empty, the way native window systems hold paints back behind input.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use crate::domain::keyboard::HotKey;
use crate::domain::native::{NativeRect, Scale};
use crate::event::{Event, NativeEvent};
use crate::platform::{Backend, NativeHandle, PlatformError};
use crate::ui::Graphics;
use crate::window::WindowClass;

/// What the headless display knows about one window
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    pub class: &'static str,
    pub area: NativeRect,
    pub visible: bool,
    pub title: String,
}

#[derive(Debug)]
struct HeadlessState {
    scale: Scale,
    next_handle: isize,
    windows: HashMap<NativeHandle, HeadlessWindow>,
    events: VecDeque<NativeEvent>,
    /// Dirty area per window, in first-invalidated order
    pending_paints: Vec<(NativeHandle, NativeRect)>,
    presented: Vec<(NativeHandle, NativeRect)>,
    frames: HashMap<NativeHandle, Graphics>,
    grabbed: HashMap<i32, HotKey>,
    refused: HashSet<HotKey>,
    sleep_when_idle: bool,
}

/// Backend half, owned by the context
#[derive(Debug)]
pub struct Headless {
    state: Rc<RefCell<HeadlessState>>,
}

/// Test-side half: injects events and inspects the display
#[derive(Debug, Clone)]
pub struct HeadlessHandle {
    state: Rc<RefCell<HeadlessState>>,
}

impl Headless {
    pub fn new(scale: Scale) -> (Headless, HeadlessHandle) {
        let state = Rc::new(RefCell::new(HeadlessState {
            scale,
            next_handle: 1,
            windows: HashMap::new(),
            events: VecDeque::new(),
            pending_paints: Vec::new(),
            presented: Vec::new(),
            frames: HashMap::new(),
            grabbed: HashMap::new(),
            refused: HashSet::new(),
            sleep_when_idle: true,
        }));
        (
            Headless {
                state: Rc::clone(&state),
            },
            HeadlessHandle { state },
        )
    }
}

impl Backend for Headless {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn display_scale(&self) -> Scale {
        self.state.borrow().scale
    }

    fn create_window(
        &mut self,
        class: &WindowClass,
        area: NativeRect,
        title: &str,
    ) -> Result<NativeHandle, PlatformError> {
        let mut state = self.state.borrow_mut();
        let handle = NativeHandle(state.next_handle);
        state.next_handle += 1;
        state.windows.insert(
            handle,
            HeadlessWindow {
                class: class.name,
                area,
                visible: false,
                title: title.to_owned(),
            },
        );
        Ok(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        let mut state = self.state.borrow_mut();
        state.windows.remove(&handle);
        state.pending_paints.retain(|(h, _)| *h != handle);
        state.frames.remove(&handle);
    }

    fn set_geometry(&mut self, handle: NativeHandle, area: NativeRect) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(&handle) {
            window.area = area;
        }
    }

    fn set_visible(&mut self, handle: NativeHandle, visible: bool) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(&handle) {
            window.visible = visible;
        }
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(&handle) {
            window.title = title.to_owned();
        }
    }

    fn invalidate(&mut self, handle: NativeHandle, area: NativeRect) {
        let mut state = self.state.borrow_mut();
        if !state.windows.contains_key(&handle) || area.empty() {
            return;
        }
        match state.pending_paints.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, dirty)) => *dirty = dirty.union(&area),
            None => state.pending_paints.push((handle, area)),
        }
    }

    fn begin_paint(&mut self, handle: NativeHandle, area: NativeRect, scale: Scale) -> Option<Graphics> {
        let mut state = self.state.borrow_mut();
        // a partial paint leaves the rest of the pending area queued
        state
            .pending_paints
            .retain(|(h, pending)| *h != handle || !area.contains(pending));
        if area.empty() || !state.windows.contains_key(&handle) {
            return None;
        }
        Graphics::new(area, scale)
    }

    fn end_paint(&mut self, handle: NativeHandle, graphics: &Graphics) {
        let mut state = self.state.borrow_mut();
        state.presented.push((handle, graphics.surface_area()));
        state.frames.insert(handle, graphics.clone());
    }

    fn grab_hot_key(&mut self, id: i32, key: HotKey) -> bool {
        let mut state = self.state.borrow_mut();
        if state.refused.contains(&key) || state.grabbed.values().any(|k| *k == key) {
            return false;
        }
        state.grabbed.insert(id, key);
        true
    }

    fn ungrab_hot_key(&mut self, id: i32) {
        self.state.borrow_mut().grabbed.remove(&id);
    }

    fn wait(&mut self, timeout: Duration) {
        let idle = {
            let state = self.state.borrow();
            state.sleep_when_idle && state.events.is_empty() && state.pending_paints.is_empty()
        };
        if idle {
            std::thread::sleep(timeout);
        }
    }

    fn poll_event(&mut self) -> Option<NativeEvent> {
        let mut state = self.state.borrow_mut();
        if let Some(event) = state.events.pop_front() {
            return Some(event);
        }
        if state.pending_paints.is_empty() {
            return None;
        }
        let (handle, dirty) = state.pending_paints.remove(0);
        Some(NativeEvent::new(handle, Event::paint(dirty)))
    }
}

impl HeadlessHandle {
    /// Queues an event as if the OS had delivered it
    pub fn push(&self, event: NativeEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    pub fn push_to(&self, handle: NativeHandle, event: Event) {
        self.push(NativeEvent::new(handle, event));
    }

    pub fn pending_events(&self) -> usize {
        self.state.borrow().events.len()
    }

    /// Coalesced dirty areas not yet painted
    pub fn pending_paints(&self) -> Vec<(NativeHandle, NativeRect)> {
        self.state.borrow().pending_paints.clone()
    }

    /// Every frame presented so far, oldest first
    pub fn presented(&self) -> Vec<(NativeHandle, NativeRect)> {
        self.state.borrow().presented.clone()
    }

    /// The last frame presented for `handle`
    pub fn last_frame(&self, handle: NativeHandle) -> Option<Graphics> {
        self.state.borrow().frames.get(&handle).cloned()
    }

    pub fn window(&self, handle: NativeHandle) -> Option<HeadlessWindow> {
        self.state.borrow().windows.get(&handle).cloned()
    }

    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }

    pub fn grabbed_hot_keys(&self) -> Vec<HotKey> {
        self.state.borrow().grabbed.values().copied().collect()
    }

    /// Makes later grabs of `key` fail, as if another process owned it
    pub fn refuse_hot_key(&self, key: HotKey) {
        self.state.borrow_mut().refused.insert(key);
    }

    /// Changes what [`Backend::display_scale`] reports
    pub fn set_display_scale(&self, scale: Scale) {
        self.state.borrow_mut().scale = scale;
    }

    /// Whether [`Backend::wait`] sleeps when nothing is queued
    pub fn set_sleep_when_idle(&self, sleep: bool) {
        self.state.borrow_mut().sleep_when_idle = sleep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(backend: &mut Headless) -> NativeHandle {
        backend
            .create_window(&WindowClass::main_window(), NativeRect::new(0, 0, 100, 100), "test")
            .unwrap()
    }

    #[test]
    fn invalidations_coalesce_per_window() {
        let (mut backend, handle) = Headless::new(Scale::IDENTITY);
        let a = window(&mut backend);
        let b = window(&mut backend);

        backend.invalidate(a, NativeRect::new(0, 0, 10, 10));
        backend.invalidate(a, NativeRect::new(20, 20, 10, 10));
        backend.invalidate(b, NativeRect::new(0, 0, 5, 5));

        assert_eq!(
            handle.pending_paints(),
            [
                (a, NativeRect::new(0, 0, 30, 30)),
                (b, NativeRect::new(0, 0, 5, 5)),
            ]
        );
    }

    #[test]
    fn input_is_delivered_before_paint() {
        let (mut backend, handle) = Headless::new(Scale::IDENTITY);
        let a = window(&mut backend);
        backend.invalidate(a, NativeRect::new(0, 0, 10, 10));
        handle.push_to(a, Event::simple(crate::event::EventKind::User));

        let first = backend.poll_event().unwrap();
        assert_eq!(first.event.kind(), crate::event::EventKind::User);
        let second = backend.poll_event().unwrap();
        assert_eq!(second.event.kind(), crate::event::EventKind::Paint);

        let graphics = backend.begin_paint(a, NativeRect::new(0, 0, 10, 10), Scale::IDENTITY).unwrap();
        backend.end_paint(a, &graphics);
        assert!(backend.poll_event().is_none());
        assert_eq!(handle.presented(), [(a, NativeRect::new(0, 0, 10, 10))]);
    }

    #[test]
    fn partial_paint_keeps_the_pending_area() {
        let (mut backend, handle) = Headless::new(Scale::IDENTITY);
        let a = window(&mut backend);
        backend.invalidate(a, NativeRect::new(0, 0, 100, 100));

        let graphics = backend.begin_paint(a, NativeRect::new(0, 0, 10, 10), Scale::IDENTITY).unwrap();
        backend.end_paint(a, &graphics);
        assert_eq!(handle.pending_paints(), [(a, NativeRect::new(0, 0, 100, 100))]);

        let graphics = backend.begin_paint(a, NativeRect::new(0, 0, 100, 100), Scale::IDENTITY).unwrap();
        backend.end_paint(a, &graphics);
        assert!(handle.pending_paints().is_empty());
    }

    #[test]
    fn duplicate_grab_fails() {
        let (mut backend, handle) = Headless::new(Scale::IDENTITY);
        let key = HotKey::new(crate::domain::keys::F5, Default::default());
        assert!(backend.grab_hot_key(1, key));
        assert!(!backend.grab_hot_key(2, key));
        backend.ungrab_hot_key(1);
        assert!(handle.grabbed_hot_keys().is_empty());

        handle.refuse_hot_key(key);
        assert!(!backend.grab_hot_key(3, key));
    }

    #[test]
    fn destroy_drops_pending_paint() {
        let (mut backend, handle) = Headless::new(Scale::IDENTITY);
        let a = window(&mut backend);
        backend.invalidate(a, NativeRect::new(0, 0, 10, 10));
        backend.destroy_window(a);
        assert!(handle.pending_paints().is_empty());
        assert_eq!(handle.window_count(), 0);
    }
}
