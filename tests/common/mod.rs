#![allow(dead_code)]

use guipp::platform::{Headless, HeadlessHandle};
use guipp::{Context, NativeHandle, Rect, Scale, ToolkitConfig, WindowClass, WindowId};

pub fn context_at(scale: f32) -> (Context, HeadlessHandle) {
    let (backend, display) = Headless::new(Scale::new(scale));
    display.set_sleep_when_idle(false);
    (Context::with_backend(Box::new(backend), ToolkitConfig::default()), display)
}

pub fn context() -> (Context, HeadlessHandle) {
    context_at(1.0)
}

/// Visible top-level window
pub fn main_window(ctx: &mut Context, area: Rect) -> (WindowId, NativeHandle) {
    let id = ctx
        .create_overlapped(WindowClass::main_window(), area, "test")
        .expect("create main window");
    ctx.set_visible(id, true);
    let handle = ctx.native_handle(id).expect("top-level window has a native handle");
    (id, handle)
}

/// Runs iterations until the backend has nothing left
pub fn settle(ctx: &mut Context) {
    for _ in 0..16 {
        if ctx.run_iteration() == 0 {
            return;
        }
    }
    panic!("events kept coming");
}
