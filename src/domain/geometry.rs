//! Logical geometry types
//!
//! [`Size`], [`Point`] and [`Rect`] are expressed in logical units (`f32`).
//! They know nothing about device pixels; see [`crate::domain::native`] for
//! the conversion into the backend's integer coordinate space.
//!
//! Ordering on [`Size`] and [`Point`] is a component-wise partial order:
//! `a < b` holds only when *both* axes compare less. Two values where one
//! axis is greater and the other smaller are neither `<` nor `>`.

use std::cmp::Ordering;
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, Div, DivAssign, Mul, MulAssign,
    Neg, Sub, SubAssign,
};

macro_rules! impl_componentwise {
    ($T:ident, $a:ident, $b:ident) => {
        impl $T {
            /// Return the minimum, componentwise
            #[must_use = "method does not modify self but returns a new value"]
            pub fn min(self, other: Self) -> Self {
                Self::new(self.$a.min(other.$a), self.$b.min(other.$b))
            }

            /// Return the maximum, componentwise
            #[must_use = "method does not modify self but returns a new value"]
            pub fn max(self, other: Self) -> Self {
                Self::new(self.$a.max(other.$a), self.$b.max(other.$b))
            }
        }

        impl PartialOrd for $T {
            fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
                if self == rhs {
                    Some(Ordering::Equal)
                } else if self.lt(rhs) {
                    Some(Ordering::Less)
                } else if self.gt(rhs) {
                    Some(Ordering::Greater)
                } else {
                    None
                }
            }

            fn lt(&self, rhs: &Self) -> bool {
                self.$a < rhs.$a && self.$b < rhs.$b
            }

            fn le(&self, rhs: &Self) -> bool {
                self.$a <= rhs.$a && self.$b <= rhs.$b
            }

            fn gt(&self, rhs: &Self) -> bool {
                self.$a > rhs.$a && self.$b > rhs.$b
            }

            fn ge(&self, rhs: &Self) -> bool {
                self.$a >= rhs.$a && self.$b >= rhs.$b
            }
        }

        impl Add for $T {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self::new(self.$a + rhs.$a, self.$b + rhs.$b)
            }
        }

        impl AddAssign for $T {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl Mul<f32> for $T {
            type Output = Self;
            fn mul(self, rhs: f32) -> Self {
                Self::new(self.$a * rhs, self.$b * rhs)
            }
        }

        impl MulAssign<f32> for $T {
            fn mul_assign(&mut self, rhs: f32) {
                *self = *self * rhs;
            }
        }

        impl Div<f32> for $T {
            type Output = Self;
            fn div(self, rhs: f32) -> Self {
                Self::new(self.$a / rhs, self.$b / rhs)
            }
        }

        impl DivAssign<f32> for $T {
            fn div_assign(&mut self, rhs: f32) {
                *self = *self / rhs;
            }
        }

        impl Neg for $T {
            type Output = Self;
            fn neg(self) -> Self {
                Self::new(-self.$a, -self.$b)
            }
        }

        impl From<(f32, f32)> for $T {
            fn from(v: (f32, f32)) -> Self {
                Self::new(v.0, v.1)
            }
        }
    };
}

/// Width and height in logical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// The constant `(0, 0)`
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Same value on both axes
    pub const fn splat(n: f32) -> Self {
        Self::new(n, n)
    }

    /// True if either dimension is zero or negative
    pub fn empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl_componentwise!(Size, width, height);

impl Sub for Size {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.width - rhs.width, self.height - rhs.height)
    }
}

impl SubAssign for Size {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// A logical position
///
/// The difference of two points is a [`Size`] (a displacement); a point plus
/// a size is a translated point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Sentinel meaning "no point", e.g. no mouse button currently held
    pub const UNDEFINED: Self = Self::new(f32::MIN, f32::MIN);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_undefined(&self) -> bool {
        *self == Self::UNDEFINED
    }

    /// Reinterpret as a displacement from the origin
    pub fn to_size(self) -> Size {
        Size::new(self.x, self.y)
    }
}

impl_componentwise!(Point, x, y);

impl Sub for Point {
    type Output = Size;
    fn sub(self, rhs: Self) -> Size {
        Size::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Size> for Point {
    type Output = Point;
    fn add(self, rhs: Size) -> Point {
        Point::new(self.x + rhs.width, self.y + rhs.height)
    }
}

impl AddAssign<Size> for Point {
    fn add_assign(&mut self, rhs: Size) {
        *self = *self + rhs;
    }
}

impl Sub<Size> for Point {
    type Output = Point;
    fn sub(self, rhs: Size) -> Point {
        Point::new(self.x - rhs.width, self.y - rhs.height)
    }
}

impl SubAssign<Size> for Point {
    fn sub_assign(&mut self, rhs: Size) {
        *self = *self - rhs;
    }
}

/// A logical rectangle stored as position plus size
///
/// The right and bottom edges ([`Rect::x2`], [`Rect::y2`]) are derived.
/// Setting them changes the size and leaves the position alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub pos: Point,
    pub size: Size,
}

impl Rect {
    /// All zero
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Returned by geometry queries that could not be answered
    pub const DEF: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub const fn from_parts(pos: Point, size: Size) -> Self {
        Self { pos, size }
    }

    /// Rectangle spanning two corners
    pub fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Self::from_parts(top_left, bottom_right - top_left)
    }

    /// Rectangle of the given size at the origin
    pub const fn with_size(size: Size) -> Self {
        Self::from_parts(Point::ZERO, size)
    }

    pub fn x(&self) -> f32 {
        self.pos.x
    }

    pub fn y(&self) -> f32 {
        self.pos.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn x2(&self) -> f32 {
        self.pos.x + self.size.width
    }

    pub fn y2(&self) -> f32 {
        self.pos.y + self.size.height
    }

    pub fn position(&self) -> Point {
        self.pos
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn top_left(&self) -> Point {
        self.pos
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x2(), self.y2())
    }

    pub fn center(&self) -> Point {
        self.pos + self.size / 2.0
    }

    pub fn set_position(&mut self, pos: Point) {
        self.pos = pos;
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Moves the right edge, resizing the rectangle
    pub fn set_x2(&mut self, x2: f32) {
        self.size.width = x2 - self.pos.x;
    }

    /// Moves the bottom edge, resizing the rectangle
    pub fn set_y2(&mut self, y2: f32) {
        self.size.height = y2 - self.pos.y;
    }

    pub fn empty(&self) -> bool {
        self.size.empty()
    }

    /// True if `p` lies within the rectangle; the right and bottom edges are exclusive
    pub fn is_inside(&self, p: Point) -> bool {
        p.x >= self.x() && p.x < self.x2() && p.y >= self.y() && p.y < self.y2()
    }

    /// True if `other` lies entirely within this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.x() >= self.x()
            && other.y() >= self.y()
            && other.x2() <= self.x2()
            && other.y2() <= self.y2()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersection(other).empty()
    }

    /// Same size, moved by `offset`
    #[must_use = "method does not modify self but returns a new value"]
    pub fn translated(&self, offset: Size) -> Rect {
        Rect::from_parts(self.pos + offset, self.size)
    }

    /// Expands each edge outwards by `s`
    #[must_use = "method does not modify self but returns a new value"]
    pub fn grow(&self, s: Size) -> Rect {
        Rect::from_parts(self.pos - s, self.size + s * 2.0)
    }

    /// Moves each edge inwards by `s`
    #[must_use = "method does not modify self but returns a new value"]
    pub fn shrink(&self, s: Size) -> Rect {
        Rect::from_parts(self.pos + s, self.size - s * 2.0)
    }

    /// Smallest rectangle covering both; an empty operand is ignored
    #[must_use = "method does not modify self but returns a new value"]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.empty() {
            return *other;
        }
        if other.empty() {
            return *self;
        }
        Rect::from_corners(
            self.top_left().min(other.top_left()),
            self.bottom_right().max(other.bottom_right()),
        )
    }

    /// Overlapping area; disjoint rectangles give an empty result
    #[must_use = "method does not modify self but returns a new value"]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let top_left = self.top_left().max(other.top_left());
        let bottom_right = self.bottom_right().min(other.bottom_right());
        let size = (bottom_right - top_left).max(Size::ZERO);
        Rect::from_parts(top_left, size)
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        Rect::with_size(size)
    }
}

impl BitOr for Rect {
    type Output = Rect;
    fn bitor(self, rhs: Rect) -> Rect {
        self.union(&rhs)
    }
}

impl BitOrAssign for Rect {
    fn bitor_assign(&mut self, rhs: Rect) {
        *self = self.union(&rhs);
    }
}

impl BitAnd for Rect {
    type Output = Rect;
    fn bitand(self, rhs: Rect) -> Rect {
        self.intersection(&rhs)
    }
}

impl BitAndAssign for Rect {
    fn bitand_assign(&mut self, rhs: Rect) {
        *self = self.intersection(&rhs);
    }
}
