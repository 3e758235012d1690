// -----------------------------------------------------------------------------
// Placement model: placements, derived occupancy layout, and the score
// -----------------------------------------------------------------------------

use std::sync::Arc;

use rand::prelude::*;
use rand_pcg::Pcg64Mcg as PcgRng;

use crate::engine::shape::Shape;
use crate::engine::ShapeId;

/// One shape at one grid position. Position is the bottom-left cell of the
/// shape's bounding box; many placements may share one `Shape`.
#[derive(Clone, Debug)]
pub struct Placement {
    pub shape: Arc<Shape>,
    pub x: i32,
    pub y: i32,
}

impl Placement {
    /// Negative coordinates clamp to zero.
    pub fn new(shape: Arc<Shape>, x: i32, y: i32) -> Self {
        Self { shape, x: x.max(0), y: y.max(0) }
    }
}

/// Derived occupancy grid. Each cell carries the ids of the shapes covering
/// it; occupancy is the length of that list. Rebuilt from scratch whenever a
/// solution's placements change, then trimmed to the tight bounding box.
#[derive(Clone, Debug)]
pub struct Layout {
    origin: (i32, i32),
    width: usize,
    height: usize,
    cells: Vec<Vec<ShapeId>>,
}

impl Layout {
    /// Preallocated grid with explicit bounds; cells start empty.
    pub fn with_bounds(origin: (i32, i32), width: usize, height: usize) -> Self {
        Self { origin, width, height, cells: vec![Vec::new(); width * height] }
    }

    /// Stamp every placement's boundary mask and trim empty borders.
    pub fn from_placements(placements: &[Placement]) -> Self {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for p in placements {
            let b = p.shape.boundary();
            if b.is_empty() {
                continue;
            }
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x + b.width() as i32);
            max_y = max_y.max(p.y + b.height() as i32);
        }
        if min_x > max_x {
            return Layout::with_bounds((0, 0), 0, 0);
        }
        let mut layout = Layout::with_bounds(
            (min_x, min_y),
            (max_x - min_x) as usize,
            (max_y - min_y) as usize,
        );
        for p in placements {
            layout.stamp(&p.shape, p.x, p.y);
        }
        layout.trim();
        layout
    }

    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Owners of the cell at world coordinates (x, y); empty out of bounds.
    pub fn owners_at(&self, x: i32, y: i32) -> &[ShapeId] {
        let lx = x - self.origin.0;
        let ly = y - self.origin.1;
        if lx < 0 || ly < 0 || lx as usize >= self.width || ly as usize >= self.height {
            return &[];
        }
        &self.cells[ly as usize * self.width + lx as usize]
    }

    #[inline]
    pub fn occupancy_at(&self, x: i32, y: i32) -> usize {
        self.owners_at(x, y).len()
    }

    /// Stamp a shape's boundary mask with its bottom-left cell at (x, y),
    /// extending the grid first if the footprint falls outside current bounds.
    pub fn stamp(&mut self, shape: &Shape, x: i32, y: i32) {
        let b = shape.boundary();
        if b.is_empty() {
            return;
        }
        self.ensure_bounds(x, y, x + b.width() as i32, y + b.height() as i32);
        for my in 0..b.height() {
            for mx in 0..b.width() {
                if !b.at(mx as i32, my as i32) {
                    continue;
                }
                let lx = (x + mx as i32 - self.origin.0) as usize;
                let ly = (y + my as i32 - self.origin.1) as usize;
                self.cells[ly * self.width + lx].push(shape.id());
            }
        }
    }

    /// Grow the grid so the half-open world rect [x0, x1) x [y0, y1) fits.
    fn ensure_bounds(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        if self.width == 0 || self.height == 0 {
            *self = Layout::with_bounds((x0, y0), (x1 - x0) as usize, (y1 - y0) as usize);
            return;
        }
        let cur_x1 = self.origin.0 + self.width as i32;
        let cur_y1 = self.origin.1 + self.height as i32;
        let nx0 = self.origin.0.min(x0);
        let ny0 = self.origin.1.min(y0);
        let nx1 = cur_x1.max(x1);
        let ny1 = cur_y1.max(y1);
        if (nx0, ny0) == self.origin && nx1 == cur_x1 && ny1 == cur_y1 {
            return;
        }
        let mut grown = Layout::with_bounds((nx0, ny0), (nx1 - nx0) as usize, (ny1 - ny0) as usize);
        for ly in 0..self.height {
            for lx in 0..self.width {
                let cell = std::mem::take(&mut self.cells[ly * self.width + lx]);
                if cell.is_empty() {
                    continue;
                }
                let gx = (self.origin.0 + lx as i32 - nx0) as usize;
                let gy = (self.origin.1 + ly as i32 - ny0) as usize;
                grown.cells[gy * grown.width + gx] = cell;
            }
        }
        *self = grown;
    }

    /// Drop all-empty border rows/columns and shift the origin accordingly.
    pub fn trim(&mut self) {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut any = false;
        for ly in 0..self.height {
            for lx in 0..self.width {
                if !self.cells[ly * self.width + lx].is_empty() {
                    any = true;
                    min_x = min_x.min(lx);
                    min_y = min_y.min(ly);
                    max_x = max_x.max(lx);
                    max_y = max_y.max(ly);
                }
            }
        }
        if !any {
            *self = Layout::with_bounds(self.origin, 0, 0);
            return;
        }
        if min_x == 0 && min_y == 0 && max_x == self.width - 1 && max_y == self.height - 1 {
            return;
        }
        let w = max_x - min_x + 1;
        let h = max_y - min_y + 1;
        let mut trimmed = Layout::with_bounds(
            (self.origin.0 + min_x as i32, self.origin.1 + min_y as i32),
            w,
            h,
        );
        for ly in 0..h {
            for lx in 0..w {
                trimmed.cells[ly * w + lx] =
                    std::mem::take(&mut self.cells[(ly + min_y) * self.width + (lx + min_x)]);
            }
        }
        *self = trimmed;
    }

    pub fn empty_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }

    /// Sum over cells of max(0, occupancy - 1).
    pub fn overlap_units(&self) -> usize {
        self.cells.iter().map(|c| c.len().saturating_sub(1)).sum()
    }

    /// Objective value: empty cells plus weighted overlap. Lower is better.
    pub fn score(&self, overlap_penalty: f64) -> f64 {
        self.empty_cells() as f64 + overlap_penalty * self.overlap_units() as f64
    }
}

/// A candidate packing: placements plus their derived layout and score.
/// `neighbor()` returns a fresh Solution instead of mutating, which is what
/// makes concurrent multi-start search safe.
#[derive(Clone, Debug)]
pub struct Solution {
    placements: Vec<Placement>,
    layout: Layout,
    score: f64,
    overlap_penalty: f64,
}

impl Solution {
    pub fn new(placements: Vec<Placement>, overlap_penalty: f64) -> Self {
        let layout = Layout::from_placements(&placements);
        let score = layout.score(overlap_penalty);
        Self { placements, layout, score, overlap_penalty }
    }

    #[inline]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// One randomized local perturbation: shift one placement by 1..=range
    /// along an axis, or swap the positions of two placements. Only position
    /// fields are copied; shape geometry stays shared.
    pub fn neighbor(&self, movement_range: u32, rng: &mut PcgRng) -> Solution {
        debug_assert!(movement_range >= 1);
        let mut placements = self.placements.clone();
        let n = placements.len();
        let do_swap = n >= 2 && rng.gen_bool(0.5);
        if do_swap {
            let i = rng.gen_range(0..n);
            let mut j = rng.gen_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            let (xi, yi) = (placements[i].x, placements[i].y);
            placements[i].x = placements[j].x;
            placements[i].y = placements[j].y;
            placements[j].x = xi;
            placements[j].y = yi;
        } else if n > 0 {
            let i = rng.gen_range(0..n);
            let amount = rng.gen_range(1..=movement_range.max(1)) as i32;
            match rng.gen_range(0..4) {
                0 => placements[i].x += amount,
                1 => placements[i].x -= amount,
                2 => placements[i].y += amount,
                _ => placements[i].y -= amount,
            }
            placements[i].x = placements[i].x.max(0);
            placements[i].y = placements[i].y.max(0);
        }
        Solution::new(placements, self.overlap_penalty)
    }

    /// True iff no cell is covered twice and the placements form one connected
    /// group. Two placements count as adjacent when their buffer footprints
    /// intersect, i.e. their boundaries are at most one empty cell apart —
    /// exactly the gap a divider can span. Empty shapes are ignored.
    pub fn is_valid(&self) -> bool {
        if self.layout.overlap_units() > 0 {
            return false;
        }
        let idx: Vec<usize> = (0..self.placements.len())
            .filter(|&i| !self.placements[i].shape.is_empty())
            .collect();
        if idx.len() <= 1 {
            return true;
        }

        let mut parent: Vec<usize> = (0..idx.len()).collect();
        fn find(parent: &mut Vec<usize>, i: usize) -> usize {
            let mut r = i;
            while parent[r] != r {
                r = parent[r];
            }
            let mut c = i;
            while parent[c] != r {
                let next = parent[c];
                parent[c] = r;
                c = next;
            }
            r
        }

        for a in 0..idx.len() {
            for b in (a + 1)..idx.len() {
                if buffers_intersect(&self.placements[idx[a]], &self.placements[idx[b]]) {
                    let ra = find(&mut parent, a);
                    let rb = find(&mut parent, b);
                    parent[ra] = rb;
                }
            }
        }
        let root = find(&mut parent, 0);
        (1..idx.len()).all(|i| find(&mut parent, i) == root)
    }
}

/// Cell-accurate intersection test between two placements' buffer masks.
/// Buffer origin sits at (-1, -1) relative to the placement position.
fn buffers_intersect(a: &Placement, b: &Placement) -> bool {
    let (ba, bb) = (a.shape.buffer(), b.shape.buffer());
    let (ax, ay) = (a.x - 1, a.y - 1);
    let (bx, by) = (b.x - 1, b.y - 1);
    let x0 = ax.max(bx);
    let y0 = ay.max(by);
    let x1 = (ax + ba.width() as i32).min(bx + bb.width() as i32);
    let y1 = (ay + ba.height() as i32).min(by + bb.height() as i32);
    if x0 >= x1 || y0 >= y1 {
        return false;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            if ba.at(x - ax, y - ay) && bb.at(x - bx, y - by) {
                return true;
            }
        }
    }
    false
}
