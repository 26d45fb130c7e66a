//! Typed handler descriptors
//!
//! An [`EventSpec`] is a zero-sized type that binds an event kind, an optional
//! match predicate and a parameter extraction scheme. Registering a closure
//! against a descriptor gives the closure exactly the arguments that kind
//! carries, already converted to the receiving window's client coordinates.
//!
//! ```ignore
//! ctx.on::<LeftButtonDown>(button, |ctx, (state, at)| {
//!     tracing::debug!("clicked at {at:?} with {state:?}");
//! });
//! ```

use crate::domain::geometry::{Point, Rect, Size};
use crate::domain::keyboard::{KeyState, KeySymbol, MouseButton};
use crate::domain::native::{FromNative, NativePoint, Scale};
use crate::event::{Event, EventKind, EventMask};
use crate::ui::Graphics;
use crate::window::WindowId;

/// What a handler knows about the window receiving the event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventContext {
    pub window: WindowId,
    pub scale: Scale,
    /// Logical position of the window's client origin on its top-level surface
    pub surface_origin: Point,
}

impl EventContext {
    pub fn new(window: WindowId, scale: Scale, surface_origin: Point) -> Self {
        Self {
            window,
            scale,
            surface_origin,
        }
    }

    /// Native surface point to this window's logical client coordinates
    pub fn surface_to_client(&self, p: NativePoint) -> Point {
        p.to_logical(self.scale) - self.surface_origin.to_size()
    }
}

/// Compile-time binding of an event kind to a typed handler signature
pub trait EventSpec: 'static {
    /// Parameters handed to the handler
    type Args;

    /// Kinds this descriptor can match
    const MASK: EventMask;

    /// Stop offering the event to later handlers once this one ran
    const CONSUMES: bool = false;

    /// Predicate beyond the kind check
    fn matches(_event: &Event) -> bool {
        true
    }

    /// `None` only when the event lacks the payload this kind promises
    fn extract(event: &Event, ctx: &EventContext) -> Option<Self::Args>;
}

macro_rules! notification {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl EventSpec for $name {
            type Args = ();
            const MASK: EventMask = EventMask::of(EventKind::$kind);

            fn extract(_: &Event, _: &EventContext) -> Option<()> {
                Some(())
            }
        }
    };
}

notification!(Created, Create);
notification!(Destroyed, Destroy);
notification!(Shown, Show);
notification!(Hidden, Hide);
notification!(FocusGained, SetFocus);
notification!(FocusLost, LostFocus);
notification!(Activated, Activate);
notification!(MouseEntered, MouseEnter);
notification!(MouseLeft, MouseLeave);

/// Close request; the first handler consumes it and the window survives
#[derive(Debug, Clone, Copy)]
pub struct Close;

impl EventSpec for Close {
    type Args = ();
    const MASK: EventMask = EventMask::of(EventKind::Close);
    const CONSUMES: bool = true;

    fn extract(_: &Event, _: &EventContext) -> Option<()> {
        Some(())
    }
}

/// Paint with a drawing context positioned at the window's client origin
#[derive(Debug, Clone, Copy)]
pub struct Paint;

impl EventSpec for Paint {
    type Args = Graphics;
    const MASK: EventMask = EventMask::of(EventKind::Paint);

    fn matches(event: &Event) -> bool {
        event.graphics().is_some()
    }

    fn extract(event: &Event, _: &EventContext) -> Option<Graphics> {
        event.graphics().cloned()
    }
}

/// New position, relative to the parent's client area
#[derive(Debug, Clone, Copy)]
pub struct Moved;

impl EventSpec for Moved {
    type Args = Point;
    const MASK: EventMask = EventMask::of(EventKind::Move);

    fn extract(event: &Event, ctx: &EventContext) -> Option<Point> {
        Some(event.rect(ctx.scale).position())
    }
}

/// New client size
#[derive(Debug, Clone, Copy)]
pub struct Resized;

impl EventSpec for Resized {
    type Args = Size;
    const MASK: EventMask = EventMask::of(EventKind::Size);

    fn extract(event: &Event, ctx: &EventContext) -> Option<Size> {
        Some(event.rect(ctx.scale).size())
    }
}

/// Children were re-arranged within the given client area
#[derive(Debug, Clone, Copy)]
pub struct Layout;

impl EventSpec for Layout {
    type Args = Rect;
    const MASK: EventMask = EventMask::of(EventKind::Layout);

    fn extract(event: &Event, ctx: &EventContext) -> Option<Rect> {
        Some(event.rect(ctx.scale))
    }
}

/// Pointer motion, client coordinates
#[derive(Debug, Clone, Copy)]
pub struct MouseMoved;

impl EventSpec for MouseMoved {
    type Args = (KeyState, Point);
    const MASK: EventMask = EventMask::of(EventKind::MouseMove);

    fn extract(event: &Event, ctx: &EventContext) -> Option<(KeyState, Point)> {
        Some((event.key_state(), ctx.surface_to_client(event.native_point())))
    }
}

macro_rules! button {
    ($(#[$meta:meta])* $name:ident, $kind:ident, $button:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl EventSpec for $name {
            type Args = (KeyState, Point);
            const MASK: EventMask = EventMask::of(EventKind::$kind);

            fn matches(event: &Event) -> bool {
                event.mouse_button() == Some(MouseButton::$button)
            }

            fn extract(event: &Event, ctx: &EventContext) -> Option<(KeyState, Point)> {
                Some((event.key_state(), ctx.surface_to_client(event.native_point())))
            }
        }
    };
}

button!(LeftButtonDown, ButtonDown, Left);
button!(LeftButtonUp, ButtonUp, Left);
button!(RightButtonDown, ButtonDown, Right);
button!(RightButtonUp, ButtonUp, Right);
button!(MiddleButtonDown, ButtonDown, Middle);
button!(MiddleButtonUp, ButtonUp, Middle);
button!(LeftButtonDoubleClick, ButtonDoubleClick, Left);

/// Any button pressed
#[derive(Debug, Clone, Copy)]
pub struct AnyButtonDown;

impl EventSpec for AnyButtonDown {
    type Args = (MouseButton, KeyState, Point);
    const MASK: EventMask = EventMask::of(EventKind::ButtonDown);

    fn matches(event: &Event) -> bool {
        event.mouse_button().is_some()
    }

    fn extract(event: &Event, ctx: &EventContext) -> Option<(MouseButton, KeyState, Point)> {
        Some((
            event.mouse_button()?,
            event.key_state(),
            ctx.surface_to_client(event.native_point()),
        ))
    }
}

/// Any button released
#[derive(Debug, Clone, Copy)]
pub struct AnyButtonUp;

impl EventSpec for AnyButtonUp {
    type Args = (MouseButton, KeyState, Point);
    const MASK: EventMask = EventMask::of(EventKind::ButtonUp);

    fn matches(event: &Event) -> bool {
        event.mouse_button().is_some()
    }

    fn extract(event: &Event, ctx: &EventContext) -> Option<(MouseButton, KeyState, Point)> {
        Some((
            event.mouse_button()?,
            event.key_state(),
            ctx.surface_to_client(event.native_point()),
        ))
    }
}

/// Vertical wheel notch: `-1` or `1` plus the pointer position
#[derive(Debug, Clone, Copy)]
pub struct WheelY;

impl EventSpec for WheelY {
    type Args = (i32, Point);
    const MASK: EventMask = EventMask::of(EventKind::Wheel);

    fn matches(event: &Event) -> bool {
        event.wheel_delta_y() != 0
    }

    fn extract(event: &Event, ctx: &EventContext) -> Option<(i32, Point)> {
        Some((
            event.wheel_delta_y(),
            ctx.surface_to_client(event.native_point()),
        ))
    }
}

/// Horizontal wheel notch
#[derive(Debug, Clone, Copy)]
pub struct WheelX;

impl EventSpec for WheelX {
    type Args = (i32, Point);
    const MASK: EventMask = EventMask::of(EventKind::Wheel);

    fn matches(event: &Event) -> bool {
        event.wheel_delta_x() != 0
    }

    fn extract(event: &Event, ctx: &EventContext) -> Option<(i32, Point)> {
        Some((
            event.wheel_delta_x(),
            ctx.surface_to_client(event.native_point()),
        ))
    }
}

/// Key press with the decoded characters
#[derive(Debug, Clone, Copy)]
pub struct KeyDown;

impl EventSpec for KeyDown {
    type Args = (KeyState, KeySymbol, String);
    const MASK: EventMask = EventMask::of(EventKind::KeyDown);

    fn extract(event: &Event, _: &EventContext) -> Option<(KeyState, KeySymbol, String)> {
        Some((
            event.key_state(),
            event.key_symbol(),
            event.key_chars().to_owned(),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyUp;

impl EventSpec for KeyUp {
    type Args = (KeyState, KeySymbol);
    const MASK: EventMask = EventMask::of(EventKind::KeyUp);

    fn extract(event: &Event, _: &EventContext) -> Option<(KeyState, KeySymbol)> {
        Some((event.key_state(), event.key_symbol()))
    }
}

/// New display scale factor
#[derive(Debug, Clone, Copy)]
pub struct ScaleChanged;

impl EventSpec for ScaleChanged {
    type Args = f32;
    const MASK: EventMask = EventMask::of(EventKind::ScaleChanged);

    fn extract(event: &Event, ctx: &EventContext) -> Option<f32> {
        Some(event.scale_factor().unwrap_or(ctx.scale.factor()))
    }
}

/// Application-defined event code
#[derive(Debug, Clone, Copy)]
pub struct User;

impl EventSpec for User {
    type Args = u32;
    const MASK: EventMask = EventMask::of(EventKind::User);

    fn extract(event: &Event, _: &EventContext) -> Option<u32> {
        Some(event.user_code().unwrap_or_default())
    }
}

/// Every event, untouched
#[derive(Debug, Clone, Copy)]
pub struct AnyEvent;

impl EventSpec for AnyEvent {
    type Args = Event;
    const MASK: EventMask = EventMask::ALL;

    fn extract(event: &Event, _: &EventContext) -> Option<Event> {
        Some(event.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keyboard::keys;
    use crate::domain::native::NativeSize;
    use slotmap::KeyData;

    fn ctx(scale: f32, origin: Point) -> EventContext {
        EventContext::new(WindowId::from(KeyData::from_ffi(1)), Scale::new(scale), origin)
    }

    #[test]
    fn button_descriptor_matches_only_its_button() {
        let left = Event::button_down(MouseButton::Left, NativePoint::ZERO, KeyState::empty());
        let right = Event::button_down(MouseButton::Right, NativePoint::ZERO, KeyState::empty());
        assert!(LeftButtonDown::matches(&left));
        assert!(!LeftButtonDown::matches(&right));
        assert!(RightButtonDown::matches(&right));
        assert!(AnyButtonDown::matches(&left) && AnyButtonDown::matches(&right));
        assert!(!LeftButtonDown::MASK.contains(EventKind::ButtonUp));
    }

    #[test]
    fn mouse_position_is_client_relative() {
        let event = Event::mouse_move(NativePoint::new(60, 40), KeyState::SHIFT);
        let (state, at) = MouseMoved::extract(&event, &ctx(2.0, Point::new(10.0, 5.0))).unwrap();
        assert_eq!(state, KeyState::SHIFT);
        assert_eq!(at, Point::new(20.0, 15.0));
    }

    #[test]
    fn wheel_axes_are_separate() {
        let event = Event::wheel(NativePoint::ZERO, NativePoint::new(0, -360), KeyState::empty());
        assert!(WheelY::matches(&event));
        assert!(!WheelX::matches(&event));
        let (delta, _) = WheelY::extract(&event, &ctx(1.0, Point::ZERO)).unwrap();
        assert_eq!(delta, -1);
    }

    #[test]
    fn key_down_extracts_chars() {
        let event = Event::key_down(keys::SPACE, KeyState::empty(), " ");
        let (_, symbol, chars) = KeyDown::extract(&event, &ctx(1.0, Point::ZERO)).unwrap();
        assert_eq!(symbol, keys::SPACE);
        assert_eq!(chars, " ");
    }

    #[test]
    fn resized_carries_the_new_size() {
        let event = Event::native_size(NativeSize::new(300, 150));
        assert_eq!(Resized::extract(&event, &ctx(1.5, Point::ZERO)), Some(Size::new(200.0, 100.0)));
        assert!(Resized::MASK.contains(EventKind::Size));
    }

    #[test]
    fn only_close_consumes() {
        assert!(Close::CONSUMES);
        assert!(!Paint::CONSUMES);
        assert!(!KeyDown::CONSUMES);
    }
}
