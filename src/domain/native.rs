//! Device-pixel geometry and the logical/native scale conversion
//!
//! Backends speak integer device pixels. Positions stay signed and pass
//! through unclamped; dimensions are unsigned, so negative logical sizes
//! clamp to zero on the way out.
//!
//! Conversions are lossy: `scale_from_native(scale_to_native(x))` is only
//! approximately `x` unless `x * factor` is already integral.

use crate::domain::geometry::{Point, Rect, Size};

/// Device-pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativePoint {
    pub x: i32,
    pub y: i32,
}

impl NativePoint {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by another native point, component-wise
    pub fn offset(self, by: NativePoint) -> NativePoint {
        NativePoint::new(self.x.saturating_add(by.x), self.y.saturating_add(by.y))
    }
}

/// Device-pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeSize {
    pub width: u32,
    pub height: u32,
}

impl NativeSize {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Device-pixel rectangle, normalized to position plus size
///
/// Backends that store left/top/right/bottom (Win32 `RECT`) convert through
/// [`NativeRect::from_ltrb`] and [`NativeRect::to_ltrb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl NativeRect {
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(pos: NativePoint, size: NativeSize) -> Self {
        Self::new(pos.x, pos.y, size.width, size.height)
    }

    /// From edge coordinates; inverted edges produce an empty rectangle
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, span(left, right), span(top, bottom))
    }

    /// Edge coordinates `(left, top, right, bottom)`
    pub fn to_ltrb(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.right(), self.bottom())
    }

    /// Right edge, clamped to `i32::MAX`
    pub fn right(&self) -> i32 {
        self.x.saturating_add(extent(self.width))
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(extent(self.height))
    }

    pub fn position(&self) -> NativePoint {
        NativePoint::new(self.x, self.y)
    }

    pub fn size(&self) -> NativeSize {
        NativeSize::new(self.width, self.height)
    }

    pub fn empty(&self) -> bool {
        self.size().empty()
    }

    pub fn is_inside(&self, p: NativePoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `other` lies entirely within; an empty `other` always does
    pub fn contains(&self, other: &NativeRect) -> bool {
        other.empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Bounding rectangle; an empty operand is ignored
    pub fn union(&self, other: &NativeRect) -> NativeRect {
        if self.empty() {
            return *other;
        }
        if other.empty() {
            return *self;
        }
        NativeRect::from_ltrb(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn intersection(&self, other: &NativeRect) -> NativeRect {
        NativeRect::from_ltrb(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }
}

fn extent(dim: u32) -> i32 {
    i32::try_from(dim).unwrap_or(i32::MAX)
}

/// Distance between two edges, zero when inverted
fn span(from: i32, to: i32) -> u32 {
    u32::try_from(i64::from(to) - i64::from(from)).unwrap_or(0)
}

/// Ratio of device pixels to logical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale(f32);

impl Scale {
    /// One device pixel per logical unit
    pub const IDENTITY: Scale = Scale(1.0);

    /// The DPI that corresponds to a factor of 1.0
    pub const BASE_DPI: u32 = 96;

    /// Creates a scale; non-finite or non-positive factors fall back to 1.0
    pub fn new(factor: f32) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Scale(factor)
        } else {
            Scale::IDENTITY
        }
    }

    /// Derives the factor from a display DPI value
    pub fn from_dpi(dpi: u32) -> Self {
        Scale::new(dpi as f32 / Self::BASE_DPI as f32)
    }

    pub fn factor(&self) -> f32 {
        self.0
    }

    /// Signed coordinate: rounded, never clamped
    pub fn coord_to_native(&self, v: f32) -> i32 {
        (v * self.0).round() as i32
    }

    /// Unsigned dimension: rounded, negative values clamp to zero
    pub fn dim_to_native(&self, v: f32) -> u32 {
        (v * self.0).round().max(0.0) as u32
    }

    pub fn coord_from_native(&self, v: i32) -> f32 {
        v as f32 / self.0
    }

    pub fn dim_from_native(&self, v: u32) -> f32 {
        v as f32 / self.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::IDENTITY
    }
}

/// Logical value with a device-pixel counterpart
pub trait ToNative {
    type Native;
    fn to_native(&self, scale: Scale) -> Self::Native;
}

/// Device-pixel value with a logical counterpart
pub trait FromNative {
    type Logical;
    fn to_logical(&self, scale: Scale) -> Self::Logical;
}

impl ToNative for f32 {
    type Native = i32;
    fn to_native(&self, scale: Scale) -> i32 {
        scale.coord_to_native(*self)
    }
}

impl FromNative for i32 {
    type Logical = f32;
    fn to_logical(&self, scale: Scale) -> f32 {
        scale.coord_from_native(*self)
    }
}

impl ToNative for Point {
    type Native = NativePoint;
    fn to_native(&self, scale: Scale) -> NativePoint {
        NativePoint::new(scale.coord_to_native(self.x), scale.coord_to_native(self.y))
    }
}

impl FromNative for NativePoint {
    type Logical = Point;
    fn to_logical(&self, scale: Scale) -> Point {
        Point::new(scale.coord_from_native(self.x), scale.coord_from_native(self.y))
    }
}

impl ToNative for Size {
    type Native = NativeSize;
    fn to_native(&self, scale: Scale) -> NativeSize {
        NativeSize::new(
            scale.dim_to_native(self.width),
            scale.dim_to_native(self.height),
        )
    }
}

impl FromNative for NativeSize {
    type Logical = Size;
    fn to_logical(&self, scale: Scale) -> Size {
        Size::new(
            scale.dim_from_native(self.width),
            scale.dim_from_native(self.height),
        )
    }
}

impl ToNative for Rect {
    type Native = NativeRect;
    fn to_native(&self, scale: Scale) -> NativeRect {
        NativeRect::from_parts(self.pos.to_native(scale), self.size.to_native(scale))
    }
}

impl FromNative for NativeRect {
    type Logical = Rect;
    fn to_logical(&self, scale: Scale) -> Rect {
        Rect::from_parts(
            self.position().to_logical(scale),
            self.size().to_logical(scale),
        )
    }
}

/// `native = round(logical * factor)`
pub fn scale_to_native<T: ToNative>(value: T, scale: Scale) -> T::Native {
    value.to_native(scale)
}

/// `logical = native / factor`
pub fn scale_from_native<T: FromNative>(value: T, scale: Scale) -> T::Logical {
    value.to_logical(scale)
}
