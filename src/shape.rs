//! The shape catalog: every piece footprint the bag can draw.
//!
//! Entries are ordered easiest to hardest and each record carries an
//! explicit weight rank the randomizer reads. Footprints near the top are
//! duplicated on purpose to bias their baseline frequency before the
//! difficulty ramp is applied.

use std::sync::LazyLock;

/// Maximum footprint side.
pub const SHAPE_MAX: usize = 5;

/// One placeable piece footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub name: &'static str,
    pub w: usize,
    pub h: usize,
    /// Difficulty rank, 0 = easiest. Drives the weighted draw.
    pub weight_rank: usize,
    cells: [[bool; SHAPE_MAX]; SHAPE_MAX],
}

impl Shape {
    /// Bounds-checked cell lookup; false outside the `w x h` footprint.
    pub fn cell(&self, x: usize, y: usize) -> bool {
        if x >= self.w || y >= self.h {
            return false;
        }
        self.cells[y][x]
    }

    /// Number of filled cells in the footprint.
    pub fn cell_count(&self) -> usize {
        self.filled_cells().count()
    }

    /// Iterate the filled `(x, y)` offsets in row-major order.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.h).flat_map(move |y| (0..self.w).filter_map(move |x| self.cells[y][x].then_some((x, y))))
    }
}

fn parse(name: &'static str, rank: usize, rows: &[&str]) -> Shape {
    let h = rows.len();
    let w = rows[0].len();
    debug_assert!(w <= SHAPE_MAX && h <= SHAPE_MAX);
    let mut cells = [[false; SHAPE_MAX]; SHAPE_MAX];
    for (y, row) in rows.iter().enumerate() {
        debug_assert_eq!(row.len(), w);
        for (x, ch) in row.chars().enumerate() {
            cells[y][x] = ch == '#';
        }
    }
    Shape { name, w, h, weight_rank: rank, cells }
}

/// The full catalog. `(name, copies, rows)` per footprint; copies expand to
/// consecutive entries with their own ranks.
static CATALOG: LazyLock<Vec<Shape>> = LazyLock::new(|| {
    let defs: &[(&'static str, usize, &[&str])] = &[
        ("1", 4, &["#"]),
        ("I2", 4, &["##"]),
        ("V2", 4, &["#", "#"]),
        ("I3", 4, &["###"]),
        ("V3", 4, &["#", "#", "#"]),
        ("D\\2", 2, &["#.", ".#"]),
        ("D/2", 2, &[".#", "#."]),
        ("L2", 1, &["#.", "##"]),
        ("J2", 1, &[".#", "##"]),
        ("O2", 1, &["##", "##"]),
        ("L3a", 1, &["#..", "###"]),
        ("L3b", 1, &["##", "#.", "#."]),
        ("J3a", 1, &["..#", "###"]),
        ("J3b", 1, &["##", ".#", ".#"]),
        ("T", 1, &["###", ".#."]),
        ("T_flip", 1, &[".#.", "###"]),
        ("T_left", 1, &[".#", "##", ".#"]),
        ("T_right", 1, &["#.", "##", "#."]),
        ("S", 1, &["##.", ".##"]),
        ("SV", 1, &[".#", "##", "#."]),
        ("Z", 1, &[".##", "##."]),
        ("ZV", 1, &["#.", "##", ".#"]),
        ("C3a", 1, &["###", "#.."]),
        ("C3c", 1, &["###", "..#"]),
        ("I4", 1, &["####"]),
        ("V4", 1, &["#", "#", "#", "#"]),
        ("L4", 1, &["#..", "#..", "###"]),
        ("J4", 1, &["..#", "..#", "###"]),
        ("T4", 1, &["###", ".#.", ".#."]),
        ("T4R", 1, &[".#.", ".#.", "###"]),
        ("U3x2", 1, &["#.#", "###"]),
        ("U3x2_flip", 1, &["###", "#.#"]),
        ("U2x3_right", 1, &["##", "#.", "##"]),
        ("U2x3_left", 1, &["##", ".#", "##"]),
        ("R3x2", 1, &["###", "###"]),
        ("R2x3", 1, &["##", "##", "##"]),
        ("Plus", 1, &[".#.", "###", ".#."]),
        ("O3", 1, &["###", "###", "###"]),
        ("D\\3", 1, &["#..", ".#.", "..#"]),
        ("D/3", 1, &["..#", ".#.", "#.."]),
        ("I5", 1, &["#####"]),
        ("V5", 1, &["#", "#", "#", "#", "#"]),
        ("D\\4", 1, &["#...", ".#..", "..#.", "...#"]),
        ("D/4", 1, &["...#", "..#.", ".#..", "#..."]),
    ];

    let mut catalog = Vec::new();
    for &(name, copies, rows) in defs {
        for _ in 0..copies {
            catalog.push(parse(name, catalog.len(), rows));
        }
    }
    catalog
});

/// Read-only access to the shared catalog.
pub fn catalog() -> &'static [Shape] {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_ranked_by_position() {
        let cat = catalog();
        assert_eq!(cat.len(), 61);
        for (i, shape) in cat.iter().enumerate() {
            assert_eq!(shape.weight_rank, i, "{} has a stale rank", shape.name);
        }
    }

    #[test]
    fn test_duplicates_keep_their_own_rank() {
        let cat = catalog();
        let dots: Vec<_> = cat.iter().filter(|s| s.name == "1").collect();
        assert_eq!(dots.len(), 4);
        assert_eq!(dots[0].weight_rank, 0);
        assert_eq!(dots[3].weight_rank, 3);
    }

    #[test]
    fn test_every_footprint_fits_and_is_nonempty() {
        for shape in catalog() {
            assert!(shape.w >= 1 && shape.w <= SHAPE_MAX);
            assert!(shape.h >= 1 && shape.h <= SHAPE_MAX);
            assert!(shape.cell_count() >= 1, "{} is empty", shape.name);
        }
    }

    #[test]
    fn test_cell_lookup_clips_to_footprint() {
        let dot = &catalog()[0];
        assert!(dot.cell(0, 0));
        assert!(!dot.cell(1, 0));
        assert!(!dot.cell(0, 1));
        assert!(!dot.cell(SHAPE_MAX, SHAPE_MAX));
    }

    #[test]
    fn test_known_cell_counts() {
        let count_of = |name: &str| {
            catalog()
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.cell_count())
                .unwrap()
        };
        assert_eq!(count_of("1"), 1);
        assert_eq!(count_of("Plus"), 5);
        assert_eq!(count_of("O3"), 9);
        assert_eq!(count_of("D/4"), 4);
    }

    #[test]
    fn test_diagonals_only_fill_the_diagonal() {
        let diag = catalog().iter().find(|s| s.name == "D\\3").unwrap();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(diag.cell(x, y), x == y);
            }
        }
    }
}
