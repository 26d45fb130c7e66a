//! Uniform event representation
//!
//! Backends translate whatever the OS hands them into an [`Event`]: an
//! [`EventKind`] tag plus an [`EventData`] payload whose shape is fixed by
//! the tag. The accessor methods on [`Event`] are the parameter-extraction
//! layer; asking for a parameter the kind does not carry yields a neutral
//! default (empty state, zero point), never a panic.
//!
//! Events live for a single dispatch. Nothing in the toolkit stores them.

pub mod dispatch;
pub mod handler;

use crate::domain::geometry::{Point, Rect};
use crate::domain::keyboard::{KeyState, KeySymbol, MouseButton};
use crate::domain::native::{FromNative, NativePoint, NativeRect, NativeSize, Scale};
use crate::platform::NativeHandle;
use crate::ui::Graphics;

pub use dispatch::{Dispatch, Dispatcher, HandlerId};
pub use handler::{EventContext, EventSpec};

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Create,
    Destroy,
    /// Close requested by the user or the window manager
    Close,
    Paint,
    Show,
    Hide,
    Move,
    Size,
    /// Children were re-arranged
    Layout,
    SetFocus,
    LostFocus,
    Activate,
    MouseEnter,
    MouseLeave,
    MouseMove,
    ButtonDown,
    ButtonUp,
    ButtonDoubleClick,
    Wheel,
    KeyDown,
    KeyUp,
    /// A globally registered key combination fired
    HotKey,
    ScaleChanged,
    User,
}

impl EventKind {
    pub const ALL: [EventKind; 24] = [
        EventKind::Create,
        EventKind::Destroy,
        EventKind::Close,
        EventKind::Paint,
        EventKind::Show,
        EventKind::Hide,
        EventKind::Move,
        EventKind::Size,
        EventKind::Layout,
        EventKind::SetFocus,
        EventKind::LostFocus,
        EventKind::Activate,
        EventKind::MouseEnter,
        EventKind::MouseLeave,
        EventKind::MouseMove,
        EventKind::ButtonDown,
        EventKind::ButtonUp,
        EventKind::ButtonDoubleClick,
        EventKind::Wheel,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::HotKey,
        EventKind::ScaleChanged,
        EventKind::User,
    ];

    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Pointer-driven kinds
    pub fn is_mouse(self) -> bool {
        EventMask::MOUSE.contains(self)
    }

    /// Keyboard-driven kinds
    pub fn is_key(self) -> bool {
        EventMask::KEYBOARD.contains(self)
    }
}

/// A set of [`EventKind`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u32);

impl EventMask {
    pub const EMPTY: EventMask = EventMask(0);
    pub const ALL: EventMask = EventMask((1 << EventKind::ALL.len()) - 1);

    pub const MOUSE: EventMask = EventMask::of(EventKind::MouseEnter)
        .with(EventKind::MouseLeave)
        .with(EventKind::MouseMove)
        .with(EventKind::ButtonDown)
        .with(EventKind::ButtonUp)
        .with(EventKind::ButtonDoubleClick)
        .with(EventKind::Wheel);
    pub const KEYBOARD: EventMask = EventMask::of(EventKind::KeyDown).with(EventKind::KeyUp);
    pub const GEOMETRY: EventMask = EventMask::of(EventKind::Move)
        .with(EventKind::Size)
        .with(EventKind::Layout);
    pub const FOCUS: EventMask = EventMask::of(EventKind::SetFocus).with(EventKind::LostFocus);

    pub const fn of(kind: EventKind) -> EventMask {
        EventMask(kind.bit())
    }

    pub const fn with(self, kind: EventKind) -> EventMask {
        EventMask(self.0 | kind.bit())
    }

    pub const fn union(self, other: EventMask) -> EventMask {
        EventMask(self.0 | other.0)
    }

    pub const fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, kind: EventKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: EventKind) {
        self.0 &= !kind.bit();
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        EventMask::of(kind)
    }
}

impl std::ops::BitOr for EventMask {
    type Output = EventMask;
    fn bitor(self, rhs: EventMask) -> EventMask {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        *self = self.union(rhs);
    }
}

/// Payload, shaped by the event kind
#[derive(Debug, Clone)]
pub enum EventData {
    None,
    /// Geometry reported by the backend (top-level windows, native pixels)
    NativeGeometry(NativeRect),
    /// Geometry synthesized by the toolkit, logical and parent-client relative
    Geometry(Rect),
    /// Pointer position is native and relative to the top-level surface
    Mouse {
        position: NativePoint,
        button: Option<MouseButton>,
        state: KeyState,
    },
    /// Raw platform delta; see [`Event::wheel_delta_y`] for the normalized step
    Wheel {
        position: NativePoint,
        delta: NativePoint,
        state: KeyState,
    },
    Key {
        symbol: KeySymbol,
        state: KeyState,
        chars: String,
    },
    Paint {
        dirty: NativeRect,
        graphics: Option<Graphics>,
    },
    Scale(f32),
    User(u32),
}

/// One platform event, normalized
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    data: EventData,
}

impl Event {
    pub fn new(kind: EventKind, data: EventData) -> Self {
        Self { kind, data }
    }

    /// Event without payload
    pub fn simple(kind: EventKind) -> Self {
        Self::new(kind, EventData::None)
    }

    pub fn geometry(kind: EventKind, rect: Rect) -> Self {
        Self::new(kind, EventData::Geometry(rect))
    }

    pub fn native_move(position: NativePoint) -> Self {
        Self::new(
            EventKind::Move,
            EventData::NativeGeometry(NativeRect::from_parts(position, NativeSize::ZERO)),
        )
    }

    pub fn native_size(size: NativeSize) -> Self {
        Self::new(
            EventKind::Size,
            EventData::NativeGeometry(NativeRect::from_parts(NativePoint::ZERO, size)),
        )
    }

    pub fn mouse_move(position: NativePoint, state: KeyState) -> Self {
        Self::new(
            EventKind::MouseMove,
            EventData::Mouse {
                position,
                button: None,
                state,
            },
        )
    }

    pub fn button_down(button: MouseButton, position: NativePoint, state: KeyState) -> Self {
        Self::button(EventKind::ButtonDown, button, position, state | button.state_flag())
    }

    pub fn button_up(button: MouseButton, position: NativePoint, state: KeyState) -> Self {
        Self::button(EventKind::ButtonUp, button, position, state - button.state_flag())
    }

    pub fn double_click(button: MouseButton, position: NativePoint, state: KeyState) -> Self {
        Self::button(EventKind::ButtonDoubleClick, button, position, state)
    }

    fn button(kind: EventKind, button: MouseButton, position: NativePoint, state: KeyState) -> Self {
        Self::new(
            kind,
            EventData::Mouse {
                position,
                button: Some(button),
                state,
            },
        )
    }

    pub fn wheel(position: NativePoint, delta: NativePoint, state: KeyState) -> Self {
        Self::new(
            EventKind::Wheel,
            EventData::Wheel {
                position,
                delta,
                state,
            },
        )
    }

    pub fn key_down(symbol: KeySymbol, state: KeyState, chars: impl Into<String>) -> Self {
        Self::new(
            EventKind::KeyDown,
            EventData::Key {
                symbol,
                state,
                chars: chars.into(),
            },
        )
    }

    pub fn key_up(symbol: KeySymbol, state: KeyState) -> Self {
        Self::new(
            EventKind::KeyUp,
            EventData::Key {
                symbol,
                state,
                chars: String::new(),
            },
        )
    }

    pub fn hot_key(symbol: KeySymbol, state: KeyState) -> Self {
        Self::new(
            EventKind::HotKey,
            EventData::Key {
                symbol,
                state,
                chars: String::new(),
            },
        )
    }

    pub fn paint(dirty: NativeRect) -> Self {
        Self::new(
            EventKind::Paint,
            EventData::Paint {
                dirty,
                graphics: None,
            },
        )
    }

    pub fn scale_changed(factor: f32) -> Self {
        Self::new(EventKind::ScaleChanged, EventData::Scale(factor))
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Modifier and button state at the time of the event
    pub fn key_state(&self) -> KeyState {
        match &self.data {
            EventData::Mouse { state, .. }
            | EventData::Wheel { state, .. }
            | EventData::Key { state, .. } => *state,
            _ => KeyState::empty(),
        }
    }

    pub fn key_symbol(&self) -> KeySymbol {
        match &self.data {
            EventData::Key { symbol, .. } => *symbol,
            _ => KeySymbol::NONE,
        }
    }

    /// Text produced by a key press, decoded by the backend's input method
    pub fn key_chars(&self) -> &str {
        match &self.data {
            EventData::Key { chars, .. } => chars,
            _ => "",
        }
    }

    pub fn mouse_button(&self) -> Option<MouseButton> {
        match &self.data {
            EventData::Mouse { button, .. } => *button,
            _ => None,
        }
    }

    /// Pointer position in native surface coordinates
    pub fn native_point(&self) -> NativePoint {
        match &self.data {
            EventData::Mouse { position, .. } | EventData::Wheel { position, .. } => *position,
            _ => NativePoint::ZERO,
        }
    }

    /// Raw wheel delta as reported by the platform
    pub fn wheel_delta(&self) -> NativePoint {
        match &self.data {
            EventData::Wheel { delta, .. } => *delta,
            _ => NativePoint::ZERO,
        }
    }

    /// Horizontal wheel step: `-1`, `0` or `1` regardless of platform magnitude
    pub fn wheel_delta_x(&self) -> i32 {
        self.wheel_delta().x.signum()
    }

    /// Vertical wheel step: `-1`, `0` or `1` regardless of platform magnitude
    pub fn wheel_delta_y(&self) -> i32 {
        self.wheel_delta().y.signum()
    }

    /// Geometry carried by move/size/layout events, in logical units
    pub fn rect(&self, scale: Scale) -> Rect {
        match &self.data {
            EventData::Geometry(rect) => *rect,
            EventData::NativeGeometry(rect) => rect.to_logical(scale),
            EventData::Paint { dirty, .. } => dirty.to_logical(scale),
            _ => Rect::ZERO,
        }
    }

    pub fn native_rect(&self) -> Option<NativeRect> {
        match &self.data {
            EventData::NativeGeometry(rect) => Some(*rect),
            EventData::Paint { dirty, .. } => Some(*dirty),
            _ => None,
        }
    }

    pub fn graphics(&self) -> Option<&Graphics> {
        match &self.data {
            EventData::Paint { graphics, .. } => graphics.as_ref(),
            _ => None,
        }
    }

    pub fn scale_factor(&self) -> Option<f32> {
        match &self.data {
            EventData::Scale(factor) => Some(*factor),
            _ => None,
        }
    }

    pub fn user_code(&self) -> Option<u32> {
        match &self.data {
            EventData::User(code) => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn with_graphics(&self, graphics: Graphics) -> Event {
        Event::new(
            self.kind,
            EventData::Paint {
                dirty: self.native_rect().unwrap_or_default(),
                graphics: Some(graphics),
            },
        )
    }

    /// Pointer position as a logical surface point
    pub fn surface_point(&self, scale: Scale) -> Point {
        self.native_point().to_logical(scale)
    }
}

/// An [`Event`] as it leaves the backend, addressed to a native window
#[derive(Debug, Clone)]
pub struct NativeEvent {
    /// `None` for events not bound to a window, such as global hot keys
    pub window: Option<NativeHandle>,
    pub event: Event,
}

impl NativeEvent {
    pub fn new(window: NativeHandle, event: Event) -> Self {
        Self {
            window: Some(window),
            event,
        }
    }

    pub fn unbound(event: Event) -> Self {
        Self {
            window: None,
            event,
        }
    }
}
