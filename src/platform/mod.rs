//! Native backend abstraction
//!
//! Exactly one backend drives a [`Context`](crate::app::Context). The Win32
//! backend is compiled on Windows; the headless backend is compiled everywhere
//! and keeps its whole "display" in memory, which is what the test suite runs
//! against.
//!
//! Backends only translate. They never echo geometry changes the toolkit
//! requested back as events, and they never decide which window an event is
//! for beyond naming the native handle it arrived on.

pub mod headless;
#[cfg(windows)]
pub mod win32;

use std::time::Duration;

use crate::domain::keyboard::HotKey;
use crate::domain::native::{NativeRect, Scale};
use crate::event::NativeEvent;
use crate::ui::Graphics;
use crate::window::WindowClass;

pub use headless::{Headless, HeadlessHandle, HeadlessWindow};

/// Opaque native window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub isize);

/// Native call failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlatformError {
    #[error("failed to register window class {0}")]
    ClassRegistration(String),

    #[error("failed to create native window")]
    WindowCreation,

    #[error("failed to query display DPI")]
    DpiQuery,
}

/// One native windowing system
pub trait Backend {
    fn name(&self) -> &'static str;

    /// Scale factor of the primary display
    fn display_scale(&self) -> Scale;

    /// Creates a hidden top-level window with client area `area`
    fn create_window(
        &mut self,
        class: &WindowClass,
        area: NativeRect,
        title: &str,
    ) -> Result<NativeHandle, PlatformError>;

    fn destroy_window(&mut self, handle: NativeHandle);

    /// Moves and resizes the client area, screen coordinates
    fn set_geometry(&mut self, handle: NativeHandle, area: NativeRect);

    fn set_visible(&mut self, handle: NativeHandle, visible: bool);

    fn set_title(&mut self, handle: NativeHandle, title: &str);

    /// Marks part of the surface dirty; repeated calls coalesce into one paint
    fn invalidate(&mut self, handle: NativeHandle, area: NativeRect);

    /// Drawing surface for the dirty `area`, or `None` if nothing can be drawn
    fn begin_paint(&mut self, handle: NativeHandle, area: NativeRect, scale: Scale) -> Option<Graphics>;

    /// Presents what was drawn since [`begin_paint`](Self::begin_paint)
    fn end_paint(&mut self, handle: NativeHandle, graphics: &Graphics);

    /// Grabs a key combination system-wide; false if the OS refused
    fn grab_hot_key(&mut self, id: i32, key: HotKey) -> bool;

    fn ungrab_hot_key(&mut self, id: i32);

    /// Blocks until an event is available or `timeout` elapses
    fn wait(&mut self, timeout: Duration);

    fn poll_event(&mut self) -> Option<NativeEvent>;
}

/// The backend for this build target
#[cfg(windows)]
pub fn native_backend() -> Result<Box<dyn Backend>, PlatformError> {
    Ok(Box::new(win32::Win32Backend::new()?))
}

/// The backend for this build target
#[cfg(not(windows))]
pub fn native_backend() -> Result<Box<dyn Backend>, PlatformError> {
    let (backend, _) = Headless::new(Scale::IDENTITY);
    Ok(Box::new(backend))
}
