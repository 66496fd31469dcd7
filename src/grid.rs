//! Grid occupancy, placement validation and line-clear detection.

use crate::shape::Shape;
use crate::theme::{self, Theme};
use rand::Rng;

/// A grid cell: empty, or filled with the colour theme of the piece that
/// stamped it. Clearing resets occupancy and theme together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Theme),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }
}

/// Cells flagged for clearing plus the number of completed lines.
///
/// A cell shared by a full row and a full column appears once in the mask
/// but the row and the column still count as two lines.
#[derive(Debug, Clone)]
pub struct ClearMask {
    size: usize,
    bits: Vec<bool>,
    pub lines: usize,
}

impl ClearMask {
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.bits[y * self.size + x]
    }
}

/// The square play grid. Side length is fixed for the session.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a new empty grid of `size x size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the cell at (x, y). Returns None if out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(self.cells[y * self.size + x])
    }

    /// Set the cell at (x, y). Returns false if out of bounds.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.size || y >= self.size {
            return false;
        }
        self.cells[y * self.size + x] = cell;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_filled()).count()
    }

    /// Placement is all-or-nothing: every filled shape cell must land
    /// in-bounds on an empty grid cell.
    pub fn can_place(&self, shape: &Shape, gx: i32, gy: i32) -> bool {
        shape.filled_cells().all(|(sx, sy)| {
            self.get(gx + sx as i32, gy + sy as i32)
                .is_some_and(|cell| cell.is_empty())
        })
    }

    /// Exhaustive origin scan; drives game-over detection.
    pub fn any_valid_placement(&self, shape: &Shape) -> bool {
        let n = self.size as i32;
        for gy in 0..n {
            for gx in 0..n {
                if self.can_place(shape, gx, gy) {
                    return true;
                }
            }
        }
        false
    }

    /// Stamp every filled shape cell with the given theme. Callers must
    /// have validated the placement first.
    pub fn place(&mut self, shape: &Shape, gx: i32, gy: i32, theme: Theme) {
        for (sx, sy) in shape.filled_cells() {
            self.set(gx + sx as i32, gy + sy as i32, Cell::Filled(theme));
        }
    }

    fn row_full(&self, y: usize) -> bool {
        (0..self.size).all(|x| self.cells[y * self.size + x].is_filled())
    }

    fn col_full(&self, x: usize) -> bool {
        (0..self.size).all(|y| self.cells[y * self.size + x].is_filled())
    }

    /// Per-row and per-column "completely occupied" flags.
    pub fn full_lines(&self) -> (Vec<bool>, Vec<bool>) {
        let rows = (0..self.size).map(|y| self.row_full(y)).collect();
        let cols = (0..self.size).map(|x| self.col_full(x)).collect();
        (rows, cols)
    }

    /// One pass over the grid: the union mask of all full rows and columns
    /// and the line count (rows + columns counted separately).
    pub fn build_clear_mask(&self) -> ClearMask {
        let (rows, cols) = self.full_lines();
        let mut bits = vec![false; self.size * self.size];
        let mut lines = 0;

        for (y, &full) in rows.iter().enumerate() {
            if full {
                lines += 1;
                for x in 0..self.size {
                    bits[y * self.size + x] = true;
                }
            }
        }
        for (x, &full) in cols.iter().enumerate() {
            if full {
                lines += 1;
                for y in 0..self.size {
                    bits[y * self.size + x] = true;
                }
            }
        }

        ClearMask { size: self.size, bits, lines }
    }

    /// Occupied cells under the mask; shared row/column cells count once.
    pub fn count_cells_in(&self, mask: &ClearMask) -> usize {
        self.cells
            .iter()
            .zip(&mask.bits)
            .filter(|&(cell, &masked)| masked && cell.is_filled())
            .count()
    }

    /// Reset every masked cell to empty.
    pub fn apply_clear(&mut self, mask: &ClearMask) {
        for (cell, &masked) in self.cells.iter_mut().zip(&mask.bits) {
            if masked {
                *cell = Cell::Empty;
            }
        }
    }

    /// Which rows and columns would be full if `shape` were stamped at
    /// (gx, gy). Works on a disposable copy; the real grid is untouched.
    pub fn predicted_full_lines(&self, shape: &Shape, gx: i32, gy: i32) -> (Vec<bool>, Vec<bool>) {
        let mut probe = self.clone();
        probe.place(shape, gx, gy, theme::PALETTE[0]);
        probe.full_lines()
    }

    /// Randomly occupy `count` cells (scramble start mode). Already-occupied
    /// cells are re-rolled; the loop gives up after 5000 attempts so a
    /// nearly-full grid cannot spin forever.
    pub fn random_fill<R: Rng>(&mut self, count: usize, rng: &mut R) {
        let mut remaining = count;
        let mut tries = 0;
        while remaining > 0 && tries < 5000 {
            tries += 1;
            let x = rng.gen_range(0..self.size);
            let y = rng.gen_range(0..self.size);
            if self.cells[y * self.size + x].is_empty() {
                self.cells[y * self.size + x] = Cell::Filled(theme::random_theme(rng));
                remaining -= 1;
            }
        }
    }
}
