//! Run loop
//!
//! One iteration drains the cross-thread actions, waits up to the poll
//! interval for the backend, then routes every pending native event. Modal
//! loops are the same loop nested inside a handler.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use tracing::{debug, error, warn};

use crate::app::Context;
use crate::domain::keyboard::HotKey;
use crate::event::NativeEvent;
use crate::input::{FilterId, HotKeyError};
use crate::window::{WindowError, WindowId};

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl Context {
    /// Runs until [`quit_main_loop`](Self::quit_main_loop) is called
    ///
    /// Returns immediately if quitting was requested before the call.
    pub fn run_main_loop(&mut self) {
        debug!(target: "guipp::run_loop", backend = self.backend.name(), "main loop started");
        while self.is_running() {
            self.run_iteration();
        }
        debug!(target: "guipp::run_loop", "main loop finished");
    }

    /// One pass of the loop; returns the number of native events routed
    pub fn run_iteration(&mut self) -> usize {
        self.drain_actions();
        if !self.is_running() {
            return 0;
        }
        self.backend.wait(self.config.poll_interval);

        let mut routed = 0;
        while self.is_running() {
            let Some(native) = self.backend.poll_event() else {
                break;
            };
            self.process_native(&native);
            routed += 1;
        }
        routed
    }

    /// Stops the loop at the end of the current iteration
    pub fn quit_main_loop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn drain_actions(&mut self) {
        let actions: Vec<_> = self.actions_rx.try_iter().collect();
        for action in actions {
            self.guarded("action", |ctx| action(ctx));
        }
    }

    fn process_native(&mut self, native: &NativeEvent) {
        self.guarded("event", |ctx| ctx.route_native(native));
    }

    /// Runs `f` behind the panic boundary when the config asks for one
    fn guarded(&mut self, what: &str, f: impl FnOnce(&mut Context)) {
        if !self.config.catch_panics {
            f(self);
            return;
        }
        let saved = self.dispatch_state();
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        if let Err(payload) = result {
            error!(
                target: "guipp::run_loop",
                what,
                message = panic_message(payload.as_ref()),
                "handler panicked"
            );
            self.restore_dispatch_state(&saved);
        }
    }

    /// Binds a process-wide key combination
    ///
    /// A combination already bound in the current frame is rejected and the
    /// first binding stays. If the OS refuses the grab the binding is kept
    /// and still fires for key presses delivered to the application.
    pub fn register_hot_key(
        &mut self,
        key: HotKey,
        window: Option<WindowId>,
        callback: impl FnMut(&mut Context) + 'static,
    ) -> Result<(), HotKeyError> {
        let native_id = match self.hot_keys.register(key, window, Box::new(callback)) {
            Ok(native_id) => native_id,
            Err(err) => {
                warn!(target: "guipp::hotkey", %key, "hot key already registered, keeping the first binding");
                return Err(err);
            }
        };
        if !self.backend.grab_hot_key(native_id, key) {
            warn!(target: "guipp::hotkey", %key, "native hot key grab failed");
        }
        debug!(target: "guipp::hotkey", %key, native_id, "hot key registered");
        Ok(())
    }

    pub fn unregister_hot_key(&mut self, key: HotKey) -> Result<(), HotKeyError> {
        let native_id = self.hot_keys.unregister(key)?;
        self.backend.ungrab_hot_key(native_id);
        debug!(target: "guipp::hotkey", %key, "hot key unregistered");
        Ok(())
    }

    /// Adds a global filter; returning true from it claims the event
    pub fn add_filter(
        &mut self,
        filter: impl FnMut(&mut Context, &NativeEvent) -> bool + 'static,
    ) -> FilterId {
        self.filters.add(Box::new(filter))
    }

    pub fn remove_filter(&mut self, id: FilterId) -> bool {
        self.filters.remove(id)
    }

    /// Shows `id` and runs a nested loop until it ends
    ///
    /// The loop ends on [`end_modal`](Self::end_modal), when the window is
    /// destroyed, or on [`quit_main_loop`](Self::quit_main_loop). Input to
    /// other top-level windows is dropped meanwhile. Hot keys registered
    /// during the loop are unregistered when it ends.
    pub fn run_modal(&mut self, id: WindowId) -> Result<(), WindowError> {
        if !self.is_valid(id) {
            return Err(WindowError::Invalid(id));
        }
        let Some(top) = self.top_level(id) else {
            return Err(WindowError::Invalid(id));
        };

        self.modal_stack.push(top);
        self.hot_keys.push_frame();
        self.set_visible(top, true);
        debug!(target: "guipp::run_loop", window = ?top, depth = self.modal_stack.len(), "modal loop started");

        while self.is_running() && self.modal_stack.contains(&top) {
            self.run_iteration();
        }

        self.modal_stack.retain(|modal| *modal != top);
        for (_, native_id) in self.hot_keys.pop_frame() {
            self.backend.ungrab_hot_key(native_id);
        }
        debug!(target: "guipp::run_loop", window = ?top, "modal loop finished");
        Ok(())
    }

    /// Ends the modal loop running for `id`'s top-level window
    pub fn end_modal(&mut self, id: WindowId) {
        if let Some(top) = self.top_level(id) {
            self.modal_stack.retain(|modal| *modal != top);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::config::ToolkitConfig;
    use crate::domain::geometry::Rect;
    use crate::domain::keyboard::{KeyState, keys};
    use crate::domain::native::Scale;
    use crate::event::{Event, EventData, EventKind};
    use crate::platform::{Headless, HeadlessHandle};
    use crate::window::WindowClass;

    fn context() -> (Context, HeadlessHandle) {
        let (backend, handle) = Headless::new(Scale::IDENTITY);
        handle.set_sleep_when_idle(false);
        (Context::with_backend(Box::new(backend), ToolkitConfig::default()), handle)
    }

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }

    #[test]
    fn actions_run_in_posting_order() {
        let (mut ctx, _) = context();
        let handle = ctx.main_thread_handle();
        let (tx, rx) = crossbeam_channel::unbounded();
        for n in 0..3 {
            let tx = tx.clone();
            handle.run_on_main(move |_| {
                let _ = tx.send(n);
            });
        }
        ctx.run_iteration();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn filters_claim_events_in_order() {
        let (mut ctx, display) = context();
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 50.0, 50.0), "main")
            .unwrap();
        let handle = ctx.native_handle(top).unwrap();

        let delivered = Rc::new(Cell::new(0));
        let counter = Rc::clone(&delivered);
        ctx.on_user(top, move |_, _| counter.set(counter.get() + 1)).unwrap();

        let filter = ctx.add_filter(|_, native| native.event.user_code() == Some(7));
        display.push_to(handle, Event::new(EventKind::User, EventData::User(7)));
        display.push_to(handle, Event::new(EventKind::User, EventData::User(8)));
        ctx.run_iteration();
        assert_eq!(delivered.get(), 1);

        assert!(ctx.remove_filter(filter));
        display.push_to(handle, Event::new(EventKind::User, EventData::User(7)));
        ctx.run_iteration();
        assert_eq!(delivered.get(), 2);
    }

    #[test]
    fn unbound_hot_key_event_fires_binding() {
        let (mut ctx, display) = context();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let key = HotKey::new(keys::F5, KeyState::CONTROL);
        ctx.register_hot_key(key, None, move |_| counter.set(counter.get() + 1))
            .unwrap();
        assert_eq!(display.grabbed_hot_keys(), [key]);

        display.push(NativeEvent::unbound(Event::hot_key(keys::F5, KeyState::CONTROL)));
        display.push(NativeEvent::unbound(Event::hot_key(keys::F5, KeyState::empty())));
        ctx.run_iteration();
        assert_eq!(fired.get(), 1);

        ctx.unregister_hot_key(key).unwrap();
        assert!(display.grabbed_hot_keys().is_empty());
        assert_eq!(ctx.unregister_hot_key(key), Err(HotKeyError::NotRegistered(key)));
    }

    #[test]
    fn refused_grab_keeps_binding() {
        let (mut ctx, display) = context();
        let key = HotKey::new(keys::F6, KeyState::empty());
        display.refuse_hot_key(key);
        assert!(ctx.register_hot_key(key, None, |_| {}).is_ok());
        assert!(ctx.hot_keys.contains(&key));
    }

    #[test]
    fn modal_on_stale_window_fails() {
        let (mut ctx, _) = context();
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 50.0, 50.0), "main")
            .unwrap();
        ctx.destroy(top);
        assert!(matches!(ctx.run_modal(top), Err(WindowError::Invalid(_))));
    }
}
