//! Drawing context handed to paint handlers
//!
//! A [`Graphics`] wraps one tiny-skia pixmap covering the dirty part of a
//! top-level window's surface. Every window painted during that cycle gets a
//! view of the same pixmap, shifted to its own client origin and clipped to
//! its surface geometry. Handlers draw in logical client coordinates.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tiny_skia::{
    Color, ColorU8, FillRule, Mask, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke,
    Transform,
};

use crate::domain::geometry::{Point, Rect};
use crate::domain::native::{NativePoint, NativeRect, Scale, ToNative};

/// Shared drawing surface for one paint cycle
#[derive(Clone)]
pub struct Graphics {
    target: Rc<RefCell<Pixmap>>,
    /// Surface coordinate of pixmap pixel (0, 0)
    origin: NativePoint,
    /// Logical surface position of the window being painted
    offset: Point,
    /// Surface coordinates
    clip: NativeRect,
    scale: Scale,
}

impl Graphics {
    /// Creates a surface for `area`, given in native surface coordinates
    ///
    /// Returns `None` when the pixmap cannot be allocated.
    pub fn new(area: NativeRect, scale: Scale) -> Option<Self> {
        let pixmap = Pixmap::new(area.width.max(1), area.height.max(1))?;
        Some(Self {
            target: Rc::new(RefCell::new(pixmap)),
            origin: area.position(),
            offset: Point::ZERO,
            clip: area,
            scale,
        })
    }

    /// View of the same pixmap for a window at `surface_area`
    pub(crate) fn for_area(&self, surface_area: Rect) -> Graphics {
        Graphics {
            target: Rc::clone(&self.target),
            origin: self.origin,
            offset: surface_area.position(),
            clip: self.clip.intersection(&surface_area.to_native(self.scale)),
            scale: self.scale,
        }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Clip rectangle in native surface coordinates
    pub fn clip_rect(&self) -> NativeRect {
        self.clip
    }

    /// Whole pixmap in native surface coordinates
    pub fn surface_area(&self) -> NativeRect {
        let pixmap = self.target.borrow();
        NativeRect::new(self.origin.x, self.origin.y, pixmap.width(), pixmap.height())
    }

    /// Client point of the current window to native surface coordinates
    pub fn to_surface(&self, p: Point) -> NativePoint {
        (p + self.offset.to_size()).to_native(self.scale)
    }

    fn to_pixmap(&self, p: Point) -> (f32, f32) {
        let f = self.scale.factor();
        (
            (p.x + self.offset.x) * f - self.origin.x as f32,
            (p.y + self.offset.y) * f - self.origin.y as f32,
        )
    }

    fn pixmap_rect(&self, r: NativeRect) -> Option<SkiaRect> {
        SkiaRect::from_xywh(
            (i64::from(r.x) - i64::from(self.origin.x)) as f32,
            (i64::from(r.y) - i64::from(self.origin.y)) as f32,
            r.width as f32,
            r.height as f32,
        )
    }

    fn clip_mask(&self, pixmap: &Pixmap) -> Option<Mask> {
        let mut mask = Mask::new(pixmap.width(), pixmap.height())?;
        let path = PathBuilder::from_rect(self.pixmap_rect(self.clip)?);
        mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
        Some(mask)
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = false;
        paint
    }

    /// Fills `r`, given in client coordinates
    pub fn fill_rect(&self, r: Rect, color: Color) {
        let native = r.translated(self.offset.to_size()).to_native(self.scale);
        let clipped = native.intersection(&self.clip);
        if clipped.empty() {
            return;
        }
        if let Some(rect) = self.pixmap_rect(clipped) {
            self.target.borrow_mut().fill_rect(
                rect,
                &Self::paint(color),
                Transform::identity(),
                None,
            );
        }
    }

    /// Fills the whole clip area
    pub fn clear(&self, color: Color) {
        if let Some(rect) = self.pixmap_rect(self.clip) {
            self.target.borrow_mut().fill_rect(
                rect,
                &Self::paint(color),
                Transform::identity(),
                None,
            );
        }
    }

    /// Outlines `r` with a stroke of `width` logical units
    pub fn frame_rect(&self, r: Rect, color: Color, width: f32) {
        let (x, y) = self.to_pixmap(r.top_left());
        let f = self.scale.factor();
        let Some(rect) = SkiaRect::from_xywh(x, y, r.width() * f, r.height() * f) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        self.stroke(&path, color, width);
    }

    /// Straight line between two client points
    pub fn draw_line(&self, from: Point, to: Point, color: Color, width: f32) {
        let mut builder = PathBuilder::new();
        let (x1, y1) = self.to_pixmap(from);
        let (x2, y2) = self.to_pixmap(to);
        builder.move_to(x1, y1);
        builder.line_to(x2, y2);
        if let Some(path) = builder.finish() {
            self.stroke(&path, color, width);
        }
    }

    fn stroke(&self, path: &tiny_skia::Path, color: Color, width: f32) {
        let mut pixmap = self.target.borrow_mut();
        let mask = self.clip_mask(&pixmap);
        let stroke = Stroke {
            width: (width * self.scale.factor()).max(1.0),
            ..Stroke::default()
        };
        pixmap.stroke_path(
            path,
            &Self::paint(color),
            &stroke,
            Transform::identity(),
            mask.as_ref(),
        );
    }

    /// Pixel at a native surface coordinate, demultiplied
    pub fn pixel(&self, p: NativePoint) -> Option<ColorU8> {
        let x = u32::try_from(p.x.checked_sub(self.origin.x)?).ok()?;
        let y = u32::try_from(p.y.checked_sub(self.origin.y)?).ok()?;
        self.target.borrow().pixel(x, y).map(|c| c.demultiply())
    }

    /// Read access for backends presenting the finished frame
    pub fn with_pixmap<R>(&self, f: impl FnOnce(&Pixmap) -> R) -> R {
        f(&self.target.borrow())
    }
}

impl fmt::Debug for Graphics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graphics")
            .field("origin", &self.origin)
            .field("offset", &self.offset)
            .field("clip", &self.clip)
            .field("scale", &self.scale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::from_rgba8(255, 0, 0, 255)
    }

    #[test]
    fn fill_respects_window_offset() {
        let g = Graphics::new(NativeRect::new(0, 0, 40, 40), Scale::IDENTITY).unwrap();
        let child = g.for_area(Rect::new(10.0, 10.0, 20.0, 20.0));
        child.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), red());

        assert_eq!(g.pixel(NativePoint::new(12, 12)).map(|c| c.red()), Some(255));
        assert_eq!(g.pixel(NativePoint::new(2, 2)).map(|c| c.alpha()), Some(0));
    }

    #[test]
    fn fill_is_clipped_to_window() {
        let g = Graphics::new(NativeRect::new(0, 0, 40, 40), Scale::IDENTITY).unwrap();
        let child = g.for_area(Rect::new(10.0, 10.0, 10.0, 10.0));
        child.fill_rect(Rect::new(0.0, 0.0, 100.0, 100.0), red());

        assert_eq!(g.pixel(NativePoint::new(19, 19)).map(|c| c.red()), Some(255));
        assert_eq!(g.pixel(NativePoint::new(25, 25)).map(|c| c.alpha()), Some(0));
    }

    #[test]
    fn scale_applies_to_drawing() {
        let g = Graphics::new(NativeRect::new(0, 0, 40, 40), Scale::new(2.0)).unwrap();
        g.fill_rect(Rect::new(5.0, 5.0, 5.0, 5.0), red());

        assert_eq!(g.pixel(NativePoint::new(11, 11)).map(|c| c.red()), Some(255));
        assert_eq!(g.pixel(NativePoint::new(21, 21)).map(|c| c.alpha()), Some(0));
        assert_eq!(g.to_surface(Point::new(5.0, 5.0)), NativePoint::new(10, 10));
    }

    #[test]
    fn origin_offsets_pixmap() {
        let g = Graphics::new(NativeRect::new(100, 50, 10, 10), Scale::IDENTITY).unwrap();
        g.clear(red());
        assert_eq!(g.surface_area(), NativeRect::new(100, 50, 10, 10));
        assert!(g.pixel(NativePoint::new(105, 55)).is_some());
        assert!(g.pixel(NativePoint::new(5, 5)).is_none());
    }
}
