//! Platform context
//!
//! A [`Context`] owns everything that is process-wide in a native toolkit:
//! the window arena, the native handle map, the hot-key table, the global
//! filters and the cross-thread action queue. It is created once on the UI
//! thread and handed as `&mut Context` to every handler, filter and action.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};
use slotmap::SlotMap;
use tracing::debug;

use crate::config::ToolkitConfig;
use crate::domain::geometry::Point;
use crate::domain::native::Scale;
use crate::input::{FilterChain, HotKeyTable};
use crate::platform::{self, Backend, NativeHandle, PlatformError};
use crate::window::{WindowId, WindowNode};

/// Closure queued for the UI thread
pub type Action = Box<dyn FnOnce(&mut Context) + Send>;

pub struct Context {
    pub(crate) backend: Box<dyn Backend>,
    pub(crate) config: ToolkitConfig,
    pub(crate) windows: SlotMap<WindowId, WindowNode>,
    pub(crate) native_map: HashMap<NativeHandle, WindowId>,
    pub(crate) scale: Scale,
    pub(crate) hot_keys: HotKeyTable<Context>,
    pub(crate) filters: FilterChain<Context>,
    pub(crate) actions_tx: Sender<Action>,
    pub(crate) actions_rx: Receiver<Action>,
    pub(crate) running: Arc<AtomicBool>,
    /// Top-level windows running a modal loop, innermost last
    pub(crate) modal_stack: Vec<WindowId>,
    pub(crate) mouse_inside: Option<WindowId>,
    pub(crate) focus: Option<WindowId>,
    /// Client position of the last button press, `UNDEFINED` while released
    pub(crate) last_mouse_down: Point,
}

/// Sendable handle for talking to the UI thread
#[derive(Clone)]
pub struct MainThreadHandle {
    actions: Sender<Action>,
    running: Arc<AtomicBool>,
}

impl MainThreadHandle {
    /// Queues `action` for the next run-loop iteration
    ///
    /// Actions posted from one thread run in posting order. Returns false
    /// once the context is gone.
    pub fn run_on_main<F>(&self, action: F) -> bool
    where
        F: FnOnce(&mut Context) + Send + 'static,
    {
        self.actions.send(Box::new(action)).is_ok()
    }

    /// Asks the run loop to stop after the current iteration
    pub fn quit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for MainThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainThreadHandle")
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

impl Context {
    /// Context on the backend this target is built for
    pub fn new(config: ToolkitConfig) -> Result<Self, PlatformError> {
        Ok(Self::with_backend(platform::native_backend()?, config))
    }

    pub fn with_backend(backend: Box<dyn Backend>, config: ToolkitConfig) -> Self {
        let scale = config.scale(backend.display_scale());
        let (actions_tx, actions_rx) = crossbeam_channel::unbounded();
        debug!(
            target: "guipp::platform",
            backend = backend.name(),
            scale = scale.factor(),
            "context created"
        );
        Self {
            backend,
            config,
            windows: SlotMap::with_key(),
            native_map: HashMap::new(),
            scale,
            hot_keys: HotKeyTable::new(),
            filters: FilterChain::new(),
            actions_tx,
            actions_rx,
            running: Arc::new(AtomicBool::new(true)),
            modal_stack: Vec::new(),
            mouse_inside: None,
            focus: None,
            last_mouse_down: Point::UNDEFINED,
        }
    }

    pub fn main_thread_handle(&self) -> MainThreadHandle {
        MainThreadHandle {
            actions: self.actions_tx.clone(),
            running: Arc::clone(&self.running),
        }
    }

    /// Queues `action` for the next run-loop iteration from the UI thread
    pub fn run_on_main<F>(&self, action: F)
    where
        F: FnOnce(&mut Context) + Send + 'static,
    {
        // the receiver lives as long as self, so the send cannot fail
        let _ = self.actions_tx.send(Box::new(action));
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn focus(&self) -> Option<WindowId> {
        self.focus
    }

    /// Window the pointer is currently over
    pub fn mouse_inside(&self) -> Option<WindowId> {
        self.mouse_inside
    }

    /// Client position of the held button press, [`Point::UNDEFINED`] if none
    pub fn last_mouse_down(&self) -> Point {
        self.last_mouse_down
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Innermost modal window
    pub fn modal_window(&self) -> Option<WindowId> {
        self.modal_stack.last().copied()
    }

    pub(crate) fn window_for_handle(&self, handle: NativeHandle) -> Option<WindowId> {
        self.native_map.get(&handle).copied()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("backend", &self.backend.name())
            .field("scale", &self.scale)
            .field("windows", &self.windows.len())
            .field("hot_keys", &self.hot_keys.len())
            .field("filters", &self.filters.len())
            .field("focus", &self.focus)
            .field("modal", &self.modal_stack)
            .finish()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let roots: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
            .collect();
        for id in roots {
            self.destroy(id);
        }
        for (_, native_id) in self.hot_keys.drain_all() {
            self.backend.ungrab_hot_key(native_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Headless;

    fn context() -> Context {
        let (backend, _) = Headless::new(Scale::new(2.0));
        Context::with_backend(Box::new(backend), ToolkitConfig::default())
    }

    #[test]
    fn scale_comes_from_display_unless_overridden() {
        assert_eq!(context().scale(), Scale::new(2.0));

        let (backend, _) = Headless::new(Scale::new(2.0));
        let ctx = Context::with_backend(Box::new(backend), ToolkitConfig::default().with_scale_factor(1.5));
        assert_eq!(ctx.scale(), Scale::new(1.5));
    }

    #[test]
    fn handle_posts_actions_and_quits() {
        let ctx = context();
        let handle = ctx.main_thread_handle();
        assert!(handle.run_on_main(|_| {}));
        assert_eq!(ctx.actions_rx.len(), 1);

        assert!(ctx.is_running());
        handle.quit();
        assert!(!ctx.is_running());

        drop(ctx);
        assert!(!handle.run_on_main(|_| {}));
    }

    #[test]
    fn starts_without_pointer_state() {
        let ctx = context();
        assert!(ctx.last_mouse_down().is_undefined());
        assert_eq!(ctx.mouse_inside(), None);
        assert_eq!(ctx.focus(), None);
        assert_eq!(ctx.modal_window(), None);
    }
}
