// -----------------------------------------------------------------------------
// Terrain scoring: distance-like topography used to bias divider growth
// -----------------------------------------------------------------------------

use serde::Serialize;

/// Discrete terrain over the growth grid. Occupied cells end up strictly the
/// highest ground; empty cells accumulate 8-neighbor increments pass by pass,
/// so ground rises from open space toward shape boundaries. Growth fronts
/// compare score differentials to hug the ridge between neighboring shapes.
#[derive(Clone, Debug, Serialize)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    scores: Vec<u64>,
    occupied: Vec<bool>,
    /// Value assigned to occupied cells and reads outside the grid
    /// (max observed empty score + 2).
    ceiling: u64,
}

impl TerrainGrid {
    /// Run the scoring iteration to a fixed point. `occupied` is row-major,
    /// y = 0 at the bottom.
    pub fn build(width: usize, height: usize, occupied: Vec<bool>) -> Self {
        assert_eq!(occupied.len(), width * height);
        let cells = width * height;
        let mut scores: Vec<u64> = occupied
            .iter()
            .map(|&occ| if occ { u64::MAX } else { 0 })
            .collect();

        let any_empty = occupied.iter().any(|&o| !o);
        let any_occupied = occupied.iter().any(|&o| o);
        if any_empty && any_occupied {
            // Each pass adds, per empty cell, the count of 8-neighbors whose
            // previous score was > 0; stop once every empty cell moved.
            let mut next = scores.clone();
            for _pass in 0..cells {
                let mut all_moved = true;
                for y in 0..height as i32 {
                    for x in 0..width as i32 {
                        let idx = y as usize * width + x as usize;
                        if occupied[idx] {
                            continue;
                        }
                        let mut inc = 0u64;
                        for dy in -1..=1 {
                            for dx in -1..=1 {
                                if dx == 0 && dy == 0 {
                                    continue;
                                }
                                let (nx, ny) = (x + dx, y + dy);
                                if nx < 0
                                    || ny < 0
                                    || nx as usize >= width
                                    || ny as usize >= height
                                {
                                    continue;
                                }
                                if scores[ny as usize * width + nx as usize] > 0 {
                                    inc += 1;
                                }
                            }
                        }
                        if inc == 0 {
                            all_moved = false;
                        }
                        next[idx] = scores[idx] + inc;
                    }
                }
                std::mem::swap(&mut scores, &mut next);
                if all_moved {
                    break;
                }
            }
        }

        let max_empty = scores
            .iter()
            .zip(&occupied)
            .filter(|(_, &occ)| !occ)
            .map(|(&s, _)| s)
            .max()
            .unwrap_or(0);
        let ceiling = max_empty + 2;
        for (s, &occ) in scores.iter_mut().zip(&occupied) {
            if occ {
                *s = ceiling;
            }
        }
        Self { width, height, scores, occupied, ceiling }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Score at grid-local (x, y); outside the grid reads as the ceiling, so
    /// the edge of the world counts as highest ground.
    #[inline]
    pub fn score_at(&self, x: i32, y: i32) -> u64 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return self.ceiling;
        }
        self.scores[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.occupied[y as usize * self.width + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_occupied_cell_scores_ring_of_ones() {
        let mut occ = vec![false; 9];
        occ[4] = true; // center of 3x3
        let t = TerrainGrid::build(3, 3, occ);
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) == (1, 1) {
                    assert_eq!(t.score_at(x, y), 3); // max(1) + 2
                } else {
                    assert_eq!(t.score_at(x, y), 1);
                }
            }
        }
        assert_eq!(t.ceiling(), 3);
    }

    #[test]
    fn strip_scores_descend_away_from_the_shape() {
        // Occupied at x=0 on a 4x1 strip: pass accumulation yields 3, 2, 1.
        let occ = vec![true, false, false, false];
        let t = TerrainGrid::build(4, 1, occ);
        assert_eq!(t.score_at(1, 0), 3);
        assert_eq!(t.score_at(2, 0), 2);
        assert_eq!(t.score_at(3, 0), 1);
        assert_eq!(t.score_at(0, 0), 5); // ceiling = 3 + 2
        assert_eq!(t.score_at(-1, 0), 5); // out of bounds reads as ceiling
    }

    #[test]
    fn all_empty_grid_stays_flat() {
        let t = TerrainGrid::build(3, 2, vec![false; 6]);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(t.score_at(x, y), 0);
            }
        }
        assert_eq!(t.ceiling(), 2);
    }
}
