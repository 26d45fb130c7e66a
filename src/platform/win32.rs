//! Win32 backend
//!
//! One window class per [`WindowClass`] name, registered on first use. The
//! window procedure translates messages into [`NativeEvent`]s and queues them
//! on a thread-local queue that [`Backend::poll_event`] drains; window
//! messages never call back into the toolkit directly.
//!
//! CRITICAL: everything here must run on the thread that created the
//! windows. The backend is `!Send` through its `PhantomData<*const ()>`.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::ffi::c_void;
use std::marker::PhantomData;
use std::time::Duration;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, DIB_RGB_COLORS, GetDC, GetUpdateRect, InvalidateRect,
    ReleaseDC, ScreenToClient, SetDIBitsToDevice, ValidateRect,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, GetDpiForSystem, SetProcessDpiAwarenessContext,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, GetKeyboardState, HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT,
    MOD_SHIFT, MOD_WIN, RegisterHotKey, ToUnicode, UnregisterHotKey, VK_CONTROL, VK_LWIN,
    VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AdjustWindowRectEx, CS_DBLCLKS, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW,
    DefWindowProcW, DestroyWindow, DispatchMessageW, IDC_ARROW, IsIconic, LoadCursorW, MSG,
    MsgWaitForMultipleObjects, PM_REMOVE, PeekMessageW, QS_ALLINPUT, RegisterClassW,
    SIZE_MINIMIZED, SW_HIDE, SW_SHOWNA, SWP_NOACTIVATE, SWP_NOZORDER, SetWindowPos,
    SetWindowTextW, ShowWindow, TranslateMessage, WINDOW_EX_STYLE, WM_ACTIVATE, WM_CLOSE,
    WM_DPICHANGED, WM_ERASEBKGND, WM_HOTKEY, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDBLCLK,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEHWHEEL, WM_MOUSEMOVE,
    WM_MOUSEWHEEL, WM_MOVE, WM_PAINT, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SIZE, WM_SYSKEYDOWN,
    WM_SYSKEYUP, WNDCLASSW, WS_OVERLAPPEDWINDOW,
};
use windows::core::PCWSTR;

use crate::domain::keyboard::{HotKey, KeyState, KeySymbol, MouseButton};
use crate::domain::native::{NativePoint, NativeRect, NativeSize, Scale};
use crate::event::{Event, EventKind, NativeEvent};
use crate::platform::{Backend, NativeHandle, PlatformError};
use crate::ui::Graphics;
use crate::window::WindowClass;

thread_local! {
    static QUEUE: RefCell<VecDeque<NativeEvent>> = const { RefCell::new(VecDeque::new()) };
}

fn push(hwnd: HWND, event: Event) {
    QUEUE.with(|queue| queue.borrow_mut().push_back(NativeEvent::new(to_handle(hwnd), event)));
}

fn to_handle(hwnd: HWND) -> NativeHandle {
    NativeHandle(hwnd.0)
}

fn to_hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.0)
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Converts a domain rectangle to a Win32 `RECT`
fn to_win32_rect(rect: &NativeRect) -> RECT {
    let (left, top, right, bottom) = rect.to_ltrb();
    RECT {
        left,
        top,
        right,
        bottom,
    }
}

/// Converts a Win32 `RECT` to a domain rectangle
fn from_win32_rect(rect: &RECT) -> NativeRect {
    NativeRect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom)
}

fn loword(v: isize) -> i32 {
    (v & 0xFFFF) as u16 as i16 as i32
}

fn hiword(v: isize) -> i32 {
    ((v >> 16) & 0xFFFF) as u16 as i16 as i32
}

fn point_from_lparam(lparam: LPARAM) -> NativePoint {
    NativePoint::new(loword(lparam.0), hiword(lparam.0))
}

/// `Size` for a `WM_SIZE`; minimizing reports nothing
fn size_event(wparam: WPARAM, lparam: LPARAM) -> Option<Event> {
    if wparam.0 == SIZE_MINIMIZED as usize {
        return None;
    }
    let size = NativeSize::new(
        (lparam.0 & 0xFFFF) as u32,
        ((lparam.0 >> 16) & 0xFFFF) as u32,
    );
    Some(Event::native_size(size))
}

fn pressed(vk: u16) -> bool {
    // high bit set while the key is down
    unsafe { GetKeyState(vk as i32) < 0 }
}

fn modifier_state() -> KeyState {
    let mut state = KeyState::empty();
    if pressed(VK_SHIFT.0) {
        state |= KeyState::SHIFT;
    }
    if pressed(VK_CONTROL.0) {
        state |= KeyState::CONTROL;
    }
    if pressed(VK_MENU.0) {
        state |= KeyState::ALT;
    }
    if pressed(VK_LWIN.0) || pressed(VK_RWIN.0) {
        state |= KeyState::SYSTEM;
    }
    state
}

/// Modifier and button state from a mouse message's `wparam`
fn mouse_state(wparam: WPARAM) -> KeyState {
    const MK_LBUTTON: usize = 0x0001;
    const MK_RBUTTON: usize = 0x0002;
    const MK_MBUTTON: usize = 0x0010;
    const MK_XBUTTON1: usize = 0x0020;
    const MK_XBUTTON2: usize = 0x0040;

    let mut state = modifier_state();
    for (mask, flag) in [
        (MK_LBUTTON, KeyState::BUTTON_LEFT),
        (MK_RBUTTON, KeyState::BUTTON_RIGHT),
        (MK_MBUTTON, KeyState::BUTTON_MIDDLE),
        (MK_XBUTTON1, KeyState::BUTTON_X1),
        (MK_XBUTTON2, KeyState::BUTTON_X2),
    ] {
        if wparam.0 & mask != 0 {
            state |= flag;
        }
    }
    state
}

/// Characters a key press produces under the current keyboard layout
fn key_chars(vk: u32, lparam: LPARAM) -> String {
    let scan = ((lparam.0 >> 16) & 0xFF) as u32;
    let mut keyboard = [0u8; 256];
    let mut buffer = [0u16; 8];
    unsafe {
        if GetKeyboardState(&mut keyboard).is_err() {
            return String::new();
        }
        let written = ToUnicode(vk, scan, Some(&keyboard), &mut buffer, 0);
        if written > 0 {
            String::from_utf16_lossy(&buffer[..written as usize])
        } else {
            String::new()
        }
    }
}

fn hot_key_modifiers(state: KeyState) -> HOT_KEY_MODIFIERS {
    let mut mods = MOD_NOREPEAT;
    if state.contains(KeyState::ALT) {
        mods |= MOD_ALT;
    }
    if state.contains(KeyState::CONTROL) {
        mods |= MOD_CONTROL;
    }
    if state.contains(KeyState::SHIFT) {
        mods |= MOD_SHIFT;
    }
    if state.contains(KeyState::SYSTEM) {
        mods |= MOD_WIN;
    }
    mods
}

fn state_from_hot_key_modifiers(mods: u32) -> KeyState {
    let mut state = KeyState::empty();
    if mods & MOD_ALT.0 != 0 {
        state |= KeyState::ALT;
    }
    if mods & MOD_CONTROL.0 != 0 {
        state |= KeyState::CONTROL;
    }
    if mods & MOD_SHIFT.0 != 0 {
        state |= KeyState::SHIFT;
    }
    if mods & MOD_WIN.0 != 0 {
        state |= KeyState::SYSTEM;
    }
    state
}

fn button_event(msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<Event> {
    let position = point_from_lparam(lparam);
    let state = mouse_state(wparam);
    let event = match msg {
        WM_LBUTTONDOWN => Event::button_down(MouseButton::Left, position, state),
        WM_LBUTTONUP => Event::button_up(MouseButton::Left, position, state),
        WM_RBUTTONDOWN => Event::button_down(MouseButton::Right, position, state),
        WM_RBUTTONUP => Event::button_up(MouseButton::Right, position, state),
        WM_MBUTTONDOWN => Event::button_down(MouseButton::Middle, position, state),
        WM_MBUTTONUP => Event::button_up(MouseButton::Middle, position, state),
        WM_LBUTTONDBLCLK => Event::double_click(MouseButton::Left, position, state),
        _ => return None,
    };
    Some(event)
}

fn wheel_event(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> Event {
    // wheel messages carry screen coordinates
    let mut point = POINT {
        x: loword(lparam.0),
        y: hiword(lparam.0),
    };
    unsafe {
        let _ = ScreenToClient(hwnd, &mut point);
    }
    let raw = hiword(wparam.0 as isize);
    let delta = if msg == WM_MOUSEHWHEEL {
        NativePoint::new(raw, 0)
    } else {
        NativePoint::new(0, raw)
    };
    Event::wheel(NativePoint::new(point.x, point.y), delta, mouse_state(wparam))
}

unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_CLOSE => {
            // the toolkit decides whether the window goes away
            push(hwnd, Event::simple(EventKind::Close));
            LRESULT(0)
        }
        WM_PAINT => {
            let mut rect = RECT::default();
            unsafe {
                if GetUpdateRect(hwnd, Some(&mut rect as *mut RECT), BOOL(0)).as_bool() {
                    push(hwnd, Event::paint(from_win32_rect(&rect)));
                }
                let _ = ValidateRect(hwnd, None);
            }
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        WM_SIZE => {
            if let Some(event) = size_event(wparam, lparam) {
                push(hwnd, event);
            }
            LRESULT(0)
        }
        WM_MOVE => {
            // iconic windows report a parking position, not a real one
            if !unsafe { IsIconic(hwnd) }.as_bool() {
                push(hwnd, Event::native_move(point_from_lparam(lparam)));
            }
            LRESULT(0)
        }
        WM_ACTIVATE => {
            if loword(wparam.0 as isize) != 0 {
                push(hwnd, Event::simple(EventKind::Activate));
            }
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            push(hwnd, Event::mouse_move(point_from_lparam(lparam), mouse_state(wparam)));
            LRESULT(0)
        }
        WM_LBUTTONDOWN | WM_LBUTTONUP | WM_RBUTTONDOWN | WM_RBUTTONUP | WM_MBUTTONDOWN
        | WM_MBUTTONUP | WM_LBUTTONDBLCLK => {
            if let Some(event) = button_event(msg, wparam, lparam) {
                push(hwnd, event);
            }
            LRESULT(0)
        }
        WM_MOUSEWHEEL | WM_MOUSEHWHEEL => {
            push(hwnd, wheel_event(hwnd, msg, wparam, lparam));
            LRESULT(0)
        }
        WM_KEYDOWN | WM_SYSKEYDOWN => {
            let vk = wparam.0 as u32;
            push(hwnd, Event::key_down(KeySymbol(vk), modifier_state(), key_chars(vk, lparam)));
            if msg == WM_SYSKEYDOWN {
                unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
            } else {
                LRESULT(0)
            }
        }
        WM_KEYUP | WM_SYSKEYUP => {
            push(hwnd, Event::key_up(KeySymbol(wparam.0 as u32), modifier_state()));
            if msg == WM_SYSKEYUP {
                unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
            } else {
                LRESULT(0)
            }
        }
        WM_DPICHANGED => {
            let dpi = hiword(wparam.0 as isize) as u32;
            push(hwnd, Event::scale_changed(Scale::from_dpi(dpi).factor()));
            // lparam points at the window rect suggested for the new DPI;
            // the resulting WM_SIZE/WM_MOVE queue after the scale change
            let suggested = lparam.0 as *const RECT;
            if let Some(rect) = unsafe { suggested.as_ref() } {
                let applied = unsafe {
                    SetWindowPos(
                        hwnd,
                        None,
                        rect.left,
                        rect.top,
                        rect.right - rect.left,
                        rect.bottom - rect.top,
                        SWP_NOZORDER | SWP_NOACTIVATE,
                    )
                };
                if applied.is_err() {
                    tracing::warn!(target: "guipp::platform", dpi, "suggested DPI rect not applied");
                }
            }
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Win32 windowing on the calling thread
pub struct Win32Backend {
    registered: HashSet<&'static str>,
    scale: Scale,
    _not_send: PhantomData<*const ()>,
}

impl Win32Backend {
    pub fn new() -> Result<Self, PlatformError> {
        unsafe {
            // fails harmlessly when a manifest already set awareness
            let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
        }
        let dpi = unsafe { GetDpiForSystem() };
        if dpi == 0 {
            return Err(PlatformError::DpiQuery);
        }
        Ok(Self {
            registered: HashSet::new(),
            scale: Scale::from_dpi(dpi),
            _not_send: PhantomData,
        })
    }

    fn register_class(&mut self, class: &WindowClass) -> Result<(), PlatformError> {
        if self.registered.contains(class.name) {
            return Ok(());
        }
        let name = wide(class.name);
        let registered = unsafe {
            let hinstance = GetModuleHandleW(None)
                .map_err(|_| PlatformError::ClassRegistration(class.name.to_owned()))?;
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW | CS_DBLCLKS,
                lpfnWndProc: Some(window_proc),
                hInstance: hinstance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: PCWSTR(name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc)
        };
        if registered == 0 {
            return Err(PlatformError::ClassRegistration(class.name.to_owned()));
        }
        self.registered.insert(class.name);
        Ok(())
    }

    /// Outer window rectangle for a client rectangle
    fn outer_rect(area: NativeRect) -> RECT {
        let mut rect = to_win32_rect(&area);
        unsafe {
            let _ = AdjustWindowRectEx(&mut rect, WS_OVERLAPPEDWINDOW, BOOL(0), WINDOW_EX_STYLE(0));
        }
        rect
    }

    fn present(hwnd: HWND, graphics: &Graphics) {
        let area = graphics.surface_area();
        graphics.with_pixmap(|pixmap| {
            // tiny-skia is RGBA, GDI wants BGRA
            let mut pixels = pixmap.data().to_vec();
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }

            let mut info = BITMAPINFO::default();
            info.bmiHeader = BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: pixmap.width() as i32,
                biHeight: -(pixmap.height() as i32),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            };

            unsafe {
                let hdc = GetDC(hwnd);
                if hdc.is_invalid() {
                    tracing::warn!(target: "guipp::platform", "GetDC failed, frame dropped");
                    return;
                }
                SetDIBitsToDevice(
                    hdc,
                    area.x,
                    area.y,
                    pixmap.width(),
                    pixmap.height(),
                    0,
                    0,
                    0,
                    pixmap.height(),
                    pixels.as_ptr() as *const c_void,
                    &info,
                    DIB_RGB_COLORS,
                );
                ReleaseDC(hwnd, hdc);
            }
        });
    }
}

impl Backend for Win32Backend {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn display_scale(&self) -> Scale {
        self.scale
    }

    fn create_window(
        &mut self,
        class: &WindowClass,
        area: NativeRect,
        title: &str,
    ) -> Result<NativeHandle, PlatformError> {
        self.register_class(class)?;
        let class_name = wide(class.name);
        let title = wide(title);
        let outer = Self::outer_rect(area);
        let (width, height) = if area.empty() {
            (CW_USEDEFAULT, CW_USEDEFAULT)
        } else {
            (outer.right - outer.left, outer.bottom - outer.top)
        };

        let hwnd = unsafe {
            let hinstance = GetModuleHandleW(None).map_err(|_| PlatformError::WindowCreation)?;
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(class_name.as_ptr()),
                PCWSTR(title.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                outer.left,
                outer.top,
                width,
                height,
                None,
                None,
                hinstance,
                None,
            )
        };
        if hwnd.0 == 0 {
            return Err(PlatformError::WindowCreation);
        }
        tracing::debug!(target: "guipp::platform", hwnd = hwnd.0, class = class.name, "created native window");
        Ok(to_handle(hwnd))
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        unsafe {
            if DestroyWindow(to_hwnd(handle)).is_err() {
                tracing::warn!(target: "guipp::platform", ?handle, "DestroyWindow failed");
            }
        }
    }

    fn set_geometry(&mut self, handle: NativeHandle, area: NativeRect) {
        let outer = Self::outer_rect(area);
        unsafe {
            if SetWindowPos(
                to_hwnd(handle),
                None,
                outer.left,
                outer.top,
                outer.right - outer.left,
                outer.bottom - outer.top,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
            .is_err()
            {
                tracing::warn!(target: "guipp::platform", ?handle, "SetWindowPos failed");
            }
        }
    }

    fn set_visible(&mut self, handle: NativeHandle, visible: bool) {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), if visible { SW_SHOWNA } else { SW_HIDE });
        }
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) {
        let title = wide(title);
        unsafe {
            let _ = SetWindowTextW(to_hwnd(handle), PCWSTR(title.as_ptr()));
        }
    }

    fn invalidate(&mut self, handle: NativeHandle, area: NativeRect) {
        let rect = to_win32_rect(&area);
        unsafe {
            let _ = InvalidateRect(to_hwnd(handle), Some(&rect as *const RECT), BOOL(0));
        }
    }

    fn begin_paint(&mut self, _handle: NativeHandle, area: NativeRect, scale: Scale) -> Option<Graphics> {
        if area.empty() {
            return None;
        }
        Graphics::new(area, scale)
    }

    fn end_paint(&mut self, handle: NativeHandle, graphics: &Graphics) {
        Self::present(to_hwnd(handle), graphics);
    }

    fn grab_hot_key(&mut self, id: i32, key: HotKey) -> bool {
        unsafe { RegisterHotKey(None, id, hot_key_modifiers(key.modifiers), key.key.code()).is_ok() }
    }

    fn ungrab_hot_key(&mut self, id: i32) {
        unsafe {
            let _ = UnregisterHotKey(None, id);
        }
    }

    fn wait(&mut self, timeout: Duration) {
        if QUEUE.with(|queue| !queue.borrow().is_empty()) {
            return;
        }
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        unsafe {
            MsgWaitForMultipleObjects(None, BOOL(0), millis, QS_ALLINPUT);
        }
    }

    fn poll_event(&mut self) -> Option<NativeEvent> {
        if let Some(event) = QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
            return Some(event);
        }
        let mut msg = MSG::default();
        unsafe {
            while QUEUE.with(|queue| queue.borrow().is_empty())
                && PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool()
            {
                if msg.message == WM_HOTKEY {
                    // thread hot keys arrive without a window
                    let mods = (msg.lParam.0 & 0xFFFF) as u32;
                    let vk = ((msg.lParam.0 >> 16) & 0xFFFF) as u32;
                    QUEUE.with(|queue| {
                        queue.borrow_mut().push_back(NativeEvent::unbound(Event::hot_key(
                            KeySymbol(vk),
                            state_from_hot_key_modifiers(mods),
                        )))
                    });
                    continue;
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        QUEUE.with(|queue| queue.borrow_mut().pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::UI::WindowsAndMessaging::{SIZE_MAXIMIZED, SIZE_RESTORED};

    #[test]
    fn rect_conversion_round_trip() {
        let rect = NativeRect::new(-100, 50, 640, 480);
        let win = to_win32_rect(&rect);
        assert_eq!((win.left, win.top, win.right, win.bottom), (-100, 50, 540, 530));
        assert_eq!(from_win32_rect(&win), rect);
    }

    #[test]
    fn lparam_words_are_signed() {
        let lparam = LPARAM(((-5i32 as u16 as isize) << 16) | (-3i32 as u16 as isize));
        assert_eq!(point_from_lparam(lparam), NativePoint::new(-3, -5));
    }

    #[test]
    fn minimizing_reports_no_size() {
        let lparam = LPARAM((480 << 16) | 640);
        assert!(size_event(WPARAM(SIZE_MINIMIZED as usize), LPARAM(0)).is_none());

        let restored = size_event(WPARAM(SIZE_RESTORED as usize), lparam).unwrap();
        assert_eq!(restored.native_rect(), Some(NativeRect::new(0, 0, 640, 480)));
        let maximized = size_event(WPARAM(SIZE_MAXIMIZED as usize), lparam).unwrap();
        assert_eq!(maximized.kind(), EventKind::Size);
    }

    #[test]
    fn hot_key_modifier_round_trip() {
        let state = KeyState::CONTROL | KeyState::ALT;
        let mods = hot_key_modifiers(state);
        assert_eq!(state_from_hot_key_modifiers(mods.0), state);
    }
}
