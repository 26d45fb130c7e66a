//! Window records
//!
//! Windows live in the [`Context`](crate::app::Context) arena and are named by
//! [`WindowId`]. A stale id never dangles: every lookup through it simply
//! finds nothing once the window is destroyed.
//!
//! Only overlapped (top-level) windows own a native handle. Child windows are
//! lightweight surfaces painted inside their top-level window's native surface.

pub mod layout;

use std::fmt;

use bitflags::bitflags;
use tiny_skia::Color;

use crate::app::Context;
use crate::domain::geometry::Rect;
use crate::event::Dispatcher;
use crate::platform::{NativeHandle, PlatformError};

pub use layout::{BorderLayout, GridCell, GridLayout, Layout, LayoutError};

slotmap::new_key_type! {
    /// Handle to a window in a [`Context`](crate::app::Context)
    pub struct WindowId;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowState: u16 {
        /// Live; cleared as soon as destruction starts
        const CREATED = 0x0001;
        const VISIBLE = 0x0002;
        const ENABLED = 0x0004;
        const FOCUSED = 0x0008;
        const ACCEPT_FOCUS = 0x0010;
        /// Invalidation is suppressed
        const REDRAW_DISABLED = 0x0020;
        /// At least one event is being dispatched to this window
        const IN_EVENT_HANDLE = 0x0040;
        /// Top-level window with its own native handle
        const OVERLAPPED = 0x0080;
    }
}

/// Errors from window operations
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("window {0:?} does not exist")]
    Invalid(WindowId),

    #[error("window {0:?} has not been created or is being destroyed")]
    NotCreated(WindowId),

    #[error("window {0:?} is already created")]
    AlreadyCreated(WindowId),

    #[error("window {0:?} is not a top-level window")]
    NotOverlapped(WindowId),

    #[error("native window creation failed: {0}")]
    Native(#[from] PlatformError),
}

/// Metadata shared by every window created with it
#[derive(Debug, Clone, PartialEq)]
pub struct WindowClass {
    pub name: &'static str,
    /// Filled behind the window before its paint handlers run
    pub background: Option<Color>,
    /// Button presses move keyboard focus to windows of this class
    pub accept_focus: bool,
}

impl WindowClass {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            background: None,
            accept_focus: false,
        }
    }

    /// Plain top-level frame
    pub fn main_window() -> Self {
        Self::new("guipp::main").with_background(Color::WHITE)
    }

    /// Transparent container for grouping children
    pub fn panel() -> Self {
        Self::new("guipp::panel")
    }

    /// Focusable child
    pub fn control() -> Self {
        Self::new("guipp::control").with_focus()
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_focus(mut self) -> Self {
        self.accept_focus = true;
        self
    }
}

/// Arena entry for one window
pub(crate) struct WindowNode {
    pub class: WindowClass,
    pub parent: Option<WindowId>,
    pub children: Vec<WindowId>,
    /// Parent-client relative; screen position for top-level windows
    pub area: Rect,
    pub state: WindowState,
    pub native: Option<NativeHandle>,
    pub title: String,
    pub dispatcher: Dispatcher<Context>,
    pub layout: Option<Box<dyn Layout>>,
    /// Nesting depth of dispatches in flight
    pub dispatch_depth: u32,
}

impl WindowNode {
    /// Inert record; [`Context::create`](crate::app::Context::create) attaches it
    pub fn new(class: WindowClass) -> Self {
        let mut state = WindowState::ENABLED;
        if class.accept_focus {
            state |= WindowState::ACCEPT_FOCUS;
        }
        Self {
            class,
            parent: None,
            children: Vec::new(),
            area: Rect::ZERO,
            state,
            native: None,
            title: String::new(),
            dispatcher: Dispatcher::new(),
            layout: None,
            dispatch_depth: 0,
        }
    }

    pub fn is_overlapped(&self) -> bool {
        self.state.contains(WindowState::OVERLAPPED)
    }

    pub fn is_created(&self) -> bool {
        self.state.contains(WindowState::CREATED)
    }

    pub fn is_visible(&self) -> bool {
        self.state.contains(WindowState::VISIBLE)
    }

    pub fn is_enabled(&self) -> bool {
        self.state.contains(WindowState::ENABLED)
    }

    /// Visible, enabled and alive
    pub fn accepts_input(&self) -> bool {
        self.state
            .contains(WindowState::CREATED | WindowState::VISIBLE | WindowState::ENABLED)
    }
}

impl fmt::Debug for WindowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowNode")
            .field("class", &self.class.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("area", &self.area)
            .field("state", &self.state)
            .field("native", &self.native)
            .field("handlers", &self.dispatcher.len())
            .finish()
    }
}
