//! Layout strategies
//!
//! A window may hold one [`Layout`]. Whenever the window's size changes the
//! layout maps the new client area to child geometries; the context applies
//! them without invalidating the children and then delivers a `Layout` event
//! to the window.

use crate::domain::geometry::{Point, Rect, Size};
use crate::window::WindowId;

/// Errors from layout configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid grid dimensions {cols}x{rows}")]
    InvalidDimensions { cols: u32, rows: u32 },

    #[error("cell ({col}, {row}) is outside a {cols}x{rows} grid")]
    CellOutOfRange {
        col: u32,
        row: u32,
        cols: u32,
        rows: u32,
    },
}

/// Maps a client area to child geometries
pub trait Layout {
    /// Child rectangles, relative to the client area's origin
    fn arrange(&mut self, area: Rect) -> Vec<(WindowId, Rect)>;

    /// Drops a child that was destroyed
    fn forget(&mut self, _window: WindowId) {}
}

/// Edge slots with fixed extents around a center that takes the rest
///
/// Top and bottom span the full width; left and right fill the height left
/// between them.
#[derive(Debug, Clone, Default)]
pub struct BorderLayout {
    top: Option<(WindowId, f32)>,
    bottom: Option<(WindowId, f32)>,
    left: Option<(WindowId, f32)>,
    right: Option<(WindowId, f32)>,
    center: Option<WindowId>,
    gap: f32,
}

impl BorderLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Space between adjacent slots
    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap.max(0.0);
        self
    }

    pub fn set_top(&mut self, window: WindowId, height: f32) {
        self.top = Some((window, height));
    }

    pub fn set_bottom(&mut self, window: WindowId, height: f32) {
        self.bottom = Some((window, height));
    }

    pub fn set_left(&mut self, window: WindowId, width: f32) {
        self.left = Some((window, width));
    }

    pub fn set_right(&mut self, window: WindowId, width: f32) {
        self.right = Some((window, width));
    }

    pub fn set_center(&mut self, window: WindowId) {
        self.center = Some(window);
    }

    pub fn top(mut self, window: WindowId, height: f32) -> Self {
        self.set_top(window, height);
        self
    }

    pub fn bottom(mut self, window: WindowId, height: f32) -> Self {
        self.set_bottom(window, height);
        self
    }

    pub fn left(mut self, window: WindowId, width: f32) -> Self {
        self.set_left(window, width);
        self
    }

    pub fn right(mut self, window: WindowId, width: f32) -> Self {
        self.set_right(window, width);
        self
    }

    pub fn center(mut self, window: WindowId) -> Self {
        self.set_center(window);
        self
    }
}

impl Layout for BorderLayout {
    fn arrange(&mut self, area: Rect) -> Vec<(WindowId, Rect)> {
        let mut placed = Vec::with_capacity(5);
        let mut rest = Rect::with_size(area.size());

        if let Some((window, height)) = self.top {
            let height = height.min(rest.height()).max(0.0);
            placed.push((window, Rect::from_parts(rest.position(), Size::new(rest.width(), height))));
            let shift = (height + self.gap).min(rest.height());
            rest = Rect::from_parts(rest.position() + Size::new(0.0, shift), rest.size() - Size::new(0.0, shift));
        }
        if let Some((window, height)) = self.bottom {
            let height = height.min(rest.height()).max(0.0);
            let y = rest.y2() - height;
            placed.push((window, Rect::new(rest.x(), y, rest.width(), height)));
            rest.set_y2((y - self.gap).max(rest.y()));
        }
        if let Some((window, width)) = self.left {
            let width = width.min(rest.width()).max(0.0);
            placed.push((window, Rect::from_parts(rest.position(), Size::new(width, rest.height()))));
            let shift = (width + self.gap).min(rest.width());
            rest = Rect::from_parts(rest.position() + Size::new(shift, 0.0), rest.size() - Size::new(shift, 0.0));
        }
        if let Some((window, width)) = self.right {
            let width = width.min(rest.width()).max(0.0);
            let x = rest.x2() - width;
            placed.push((window, Rect::new(x, rest.y(), width, rest.height())));
            rest.set_x2((x - self.gap).max(rest.x()));
        }
        if let Some(window) = self.center {
            placed.push((window, rest));
        }
        placed
    }

    fn forget(&mut self, window: WindowId) {
        for slot in [&mut self.top, &mut self.bottom, &mut self.left, &mut self.right] {
            if slot.is_some_and(|(id, _)| id == window) {
                *slot = None;
            }
        }
        if self.center == Some(window) {
            self.center = None;
        }
    }
}

/// A cell position in a [`GridLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub col: u32,
    pub row: u32,
}

impl GridCell {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Uniform grid of cells; a child may span a block of cells
#[derive(Debug, Clone)]
pub struct GridLayout {
    cols: u32,
    rows: u32,
    gap: f32,
    children: Vec<(WindowId, GridCell, GridCell)>,
}

impl GridLayout {
    /// Creates an empty grid
    ///
    /// # Arguments
    /// * `cols` - Number of columns (must be > 0)
    /// * `rows` - Number of rows (must be > 0)
    pub fn new(cols: u32, rows: u32) -> Result<Self, LayoutError> {
        if cols == 0 || rows == 0 {
            return Err(LayoutError::InvalidDimensions { cols, rows });
        }
        Ok(Self {
            cols,
            rows,
            gap: 0.0,
            children: Vec::new(),
        })
    }

    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap.max(0.0);
        self
    }

    /// Returns the grid dimensions as (cols, rows)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn contains_cell(&self, cell: GridCell) -> bool {
        cell.col < self.cols && cell.row < self.rows
    }

    fn check(&self, cell: GridCell) -> Result<(), LayoutError> {
        if self.contains_cell(cell) {
            Ok(())
        } else {
            Err(LayoutError::CellOutOfRange {
                col: cell.col,
                row: cell.row,
                cols: self.cols,
                rows: self.rows,
            })
        }
    }

    /// Puts `window` into a single cell
    pub fn add(&mut self, window: WindowId, cell: GridCell) -> Result<(), LayoutError> {
        self.span(window, cell, cell)
    }

    /// Puts `window` over the block bounded by two cells, in any order
    pub fn span(&mut self, window: WindowId, start: GridCell, end: GridCell) -> Result<(), LayoutError> {
        self.check(start)?;
        self.check(end)?;
        self.children.retain(|(id, _, _)| *id != window);
        self.children.push((window, start, end));
        Ok(())
    }

    /// Size of one cell within `area`, gaps excluded
    pub fn cell_size(&self, area: Size) -> Size {
        let gaps = Size::new(
            self.gap * (self.cols - 1) as f32,
            self.gap * (self.rows - 1) as f32,
        );
        let free = (area - gaps).max(Size::ZERO);
        Size::new(free.width / self.cols as f32, free.height / self.rows as f32)
    }

    /// Rectangle covering both cells and the gaps between them
    ///
    /// # Arguments
    /// * `area` - Client area the grid divides
    /// * `start` - First grid cell
    /// * `end` - Second grid cell
    pub fn cells_rect(&self, area: Size, start: GridCell, end: GridCell) -> Rect {
        let cell = self.cell_size(area);
        let step = cell + Size::splat(self.gap);
        let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));
        let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));

        let top_left = Point::new(step.width * min_col as f32, step.height * min_row as f32);
        let bottom_right = Point::new(
            step.width * max_col as f32 + cell.width,
            step.height * max_row as f32 + cell.height,
        );
        Rect::from_corners(top_left, bottom_right)
    }
}

impl Layout for GridLayout {
    fn arrange(&mut self, area: Rect) -> Vec<(WindowId, Rect)> {
        self.children
            .iter()
            .map(|&(window, start, end)| (window, self.cells_rect(area.size(), start, end)))
            .collect()
    }

    fn forget(&mut self, window: WindowId) {
        self.children.retain(|(id, _, _)| *id != window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<WindowId> {
        let mut map = SlotMap::<WindowId, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn border_center_fills_client_area() {
        let id = ids(1)[0];
        let mut layout = BorderLayout::new().center(id);
        let placed = layout.arrange(Rect::new(30.0, 40.0, 200.0, 150.0));
        assert_eq!(placed, [(id, Rect::new(0.0, 0.0, 200.0, 150.0))]);
    }

    #[test]
    fn border_edges() {
        let w = ids(5);
        let mut layout = BorderLayout::new()
            .top(w[0], 20.0)
            .bottom(w[1], 10.0)
            .left(w[2], 30.0)
            .right(w[3], 40.0)
            .center(w[4]);
        let placed = layout.arrange(Rect::new(0.0, 0.0, 200.0, 100.0));

        assert_eq!(placed[0], (w[0], Rect::new(0.0, 0.0, 200.0, 20.0)));
        assert_eq!(placed[1], (w[1], Rect::new(0.0, 90.0, 200.0, 10.0)));
        assert_eq!(placed[2], (w[2], Rect::new(0.0, 20.0, 30.0, 70.0)));
        assert_eq!(placed[3], (w[3], Rect::new(160.0, 20.0, 40.0, 70.0)));
        assert_eq!(placed[4], (w[4], Rect::new(30.0, 20.0, 130.0, 70.0)));
    }

    #[test]
    fn border_forget_clears_slot() {
        let w = ids(2);
        let mut layout = BorderLayout::new().top(w[0], 20.0).center(w[1]);
        layout.forget(w[0]);
        assert_eq!(layout.arrange(Rect::new(0.0, 0.0, 50.0, 50.0)), [(w[1], Rect::new(0.0, 0.0, 50.0, 50.0))]);
    }

    #[test]
    fn grid_invalid_dimensions() {
        assert!(matches!(
            GridLayout::new(0, 2),
            Err(LayoutError::InvalidDimensions { cols: 0, rows: 2 })
        ));
    }

    #[test]
    fn grid_cells_with_gap() {
        let w = ids(2);
        let mut grid = GridLayout::new(2, 2).unwrap().with_gap(10.0);
        grid.add(w[0], GridCell::new(1, 0)).unwrap();
        grid.span(w[1], GridCell::new(1, 1), GridCell::new(0, 1)).unwrap();

        let placed = grid.arrange(Rect::new(0.0, 0.0, 210.0, 110.0));
        assert_eq!(placed[0], (w[0], Rect::new(110.0, 0.0, 100.0, 50.0)));
        assert_eq!(placed[1], (w[1], Rect::new(0.0, 60.0, 210.0, 50.0)));
    }

    #[test]
    fn grid_rejects_cells_outside() {
        let w = ids(1);
        let mut grid = GridLayout::new(3, 2).unwrap();
        assert!(matches!(
            grid.add(w[0], GridCell::new(3, 0)),
            Err(LayoutError::CellOutOfRange { col: 3, .. })
        ));
    }
}
