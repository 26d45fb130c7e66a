//! Pure value types shared by every layer
//!
//! Nothing in here touches a native backend.

pub mod geometry;
pub mod keyboard;
pub mod native;

pub use geometry::{Point, Rect, Size};
pub use keyboard::{HotKey, KeyState, KeySymbol, MouseButton, keys};
pub use native::{
    FromNative, NativePoint, NativeRect, NativeSize, Scale, ToNative, scale_from_native,
    scale_to_native,
};
