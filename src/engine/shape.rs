// -----------------------------------------------------------------------------
// Shape geometry: boundary masks and their one-cell buffers
// -----------------------------------------------------------------------------

use crate::engine::ShapeId;

/// Boolean occupancy grid, row-major, y = 0 at the bottom row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize, cells: Vec<bool>) -> Self {
        assert_eq!(cells.len(), width * height, "mask cell count mismatch");
        Self { width, height, cells }
    }

    /// Fully occupied rectangle.
    pub fn solid(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![true; width * height] }
    }

    /// Build from visual rows (first string is the TOP row); '#' marks an
    /// occupied cell. Intended for tests and fixtures.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut cells = vec![false; width * height];
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), width, "ragged mask rows");
            let y = height - 1 - i;
            for (x, ch) in row.chars().enumerate() {
                cells[y * width + x] = ch == '#';
            }
        }
        Self { width, height, cells }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Occupancy at (x, y); out-of-bounds reads as empty.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x]
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    /// Tight copy with all-empty border rows/columns removed.
    pub fn trimmed(&self) -> Mask {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut any = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[y * self.width + x] {
                    any = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if !any {
            return Mask { width: 0, height: 0, cells: Vec::new() };
        }
        let w = max_x - min_x + 1;
        let h = max_y - min_y + 1;
        let mut cells = vec![false; w * h];
        for y in 0..h {
            for x in 0..w {
                cells[y * w + x] = self.cells[(y + min_y) * self.width + (x + min_x)];
            }
        }
        Mask { width: w, height: h, cells }
    }

    /// Dilate one cell in all 8 directions. The result is two cells wider and
    /// taller; its origin sits at (-1, -1) relative to the source mask.
    pub fn dilated(&self) -> Mask {
        if self.is_empty() {
            return Mask { width: 0, height: 0, cells: Vec::new() };
        }
        let w = self.width + 2;
        let h = self.height + 2;
        let mut cells = vec![false; w * h];
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.cells[y * self.width + x] {
                    continue;
                }
                for dy in 0..3 {
                    for dx in 0..3 {
                        cells[(y + dy) * w + (x + dx)] = true;
                    }
                }
            }
        }
        Mask { width: w, height: h, cells }
    }
}

/// Immutable geometry of one cubby: trimmed boundary mask plus its one-cell
/// dilation (the soft collision margin). Shared across placements via `Arc`.
#[derive(Clone, Debug)]
pub struct Shape {
    id: ShapeId,
    boundary: Mask,
    buffer: Mask,
}

impl Shape {
    /// Trims the input mask to its bounding box. An all-empty mask yields an
    /// empty shape; downstream stages treat it as degenerate, not fatal.
    pub fn new(id: ShapeId, mask: Mask) -> Self {
        let boundary = mask.trimmed();
        let buffer = boundary.dilated();
        Self { id, boundary, buffer }
    }

    #[inline]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    #[inline]
    pub fn boundary(&self) -> &Mask {
        &self.boundary
    }

    /// Boundary dilated by one cell; origin offset (-1, -1) from the boundary.
    #[inline]
    pub fn buffer(&self) -> &Mask {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.boundary.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.boundary.cell_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_uses_bottom_left_origin() {
        let m = Mask::from_rows(&[
            "#.",
            ".#",
        ]);
        assert!(m.at(1, 0));
        assert!(m.at(0, 1));
        assert!(!m.at(0, 0));
        assert!(!m.at(1, 1));
    }

    #[test]
    fn trimmed_drops_empty_borders() {
        let m = Mask::from_rows(&[
            "....",
            ".##.",
            "....",
        ]);
        let t = m.trimmed();
        assert_eq!((t.width(), t.height()), (2, 1));
        assert_eq!(t.cell_count(), 2);
    }

    #[test]
    fn trimmed_empty_mask_is_zero_sized() {
        let t = Mask::from_rows(&["..", ".."]).trimmed();
        assert_eq!((t.width(), t.height()), (0, 0));
        assert!(t.is_empty());
    }

    #[test]
    fn dilation_grows_one_cell_in_all_directions() {
        let b = Mask::solid(1, 1).dilated();
        assert_eq!((b.width(), b.height()), (3, 3));
        assert_eq!(b.cell_count(), 9);

        let b = Mask::solid(3, 3).dilated();
        assert_eq!((b.width(), b.height()), (5, 5));
        assert_eq!(b.cell_count(), 25);
    }

    #[test]
    fn shape_trims_on_construction() {
        let s = Shape::new(
            ShapeId(1),
            Mask::from_rows(&[
                "....",
                ".#..",
                ".##.",
                "....",
            ]),
        );
        assert_eq!((s.boundary().width(), s.boundary().height()), (2, 2));
        assert_eq!(s.cell_count(), 3);
        assert_eq!((s.buffer().width(), s.buffer().height()), (4, 4));
    }
}
