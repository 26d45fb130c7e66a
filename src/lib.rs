//! Event dispatch and geometry core of a GUI toolkit
//!
//! A [`Context`] owns one native backend and every window created through
//! it. Native events are translated into [`Event`]s, routed through global
//! filters and hot keys to a window, and offered to the typed handlers
//! registered on that window in registration order.
//!
//! ```no_run
//! use guipp::{Context, Rect, ToolkitConfig, WindowClass};
//!
//! let mut ctx = Context::new(ToolkitConfig::default())?;
//! let main = ctx.create_overlapped(WindowClass::main_window(), Rect::new(100.0, 100.0, 640.0, 480.0), "demo")?;
//! ctx.on_size(main, |_, size| tracing::info!(?size, "resized"))?;
//! ctx.set_visible(main, true);
//! ctx.run_main_loop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod event;
pub mod input;
pub mod platform;
pub mod ui;
pub mod window;

pub use app::{Context, MainThreadHandle};
pub use config::{ConfigError, ToolkitConfig};
pub use domain::{
    HotKey, KeyState, KeySymbol, MouseButton, NativePoint, NativeRect, NativeSize, Point, Rect,
    Scale, Size, keys,
};
pub use event::{Event, EventKind, EventMask, HandlerId, NativeEvent};
pub use input::{FilterId, HotKeyError};
pub use platform::{Backend, NativeHandle, PlatformError};
pub use ui::{Color, Graphics};
pub use window::{
    BorderLayout, GridLayout, Layout, WindowClass, WindowError, WindowId, WindowState,
};
