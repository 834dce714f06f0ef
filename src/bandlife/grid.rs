//! Dense toroidal cell grid.
//!
//! Cells are stored row-major as one byte each (0 dead, 1 alive). Neighbor
//! lookups wrap on both axes, so the first and last rows (and columns) are
//! adjacent and borders need no special casing.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::rules::{ALIVE, DEAD};

/// Live density used by [`Grid::random`]: each cell is a fair coin flip.
pub const DEFAULT_DENSITY: f64 = 0.5;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: Vec<u8>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// An all-dead grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![DEAD; rows * cols],
            rows,
            cols,
        }
    }

    /// Every cell independently alive with probability one half.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self::random_with_density(rows, cols, DEFAULT_DENSITY, rng)
    }

    /// Every cell independently alive with probability `density`.
    ///
    /// # Panics
    /// Panics if `density` is outside `[0, 1]`.
    pub fn random_with_density<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        density: f64,
        rng: &mut R,
    ) -> Self {
        let cells = (0..rows * cols)
            .map(|_| rng.random_bool(density) as u8)
            .collect();
        Self { cells, rows, cols }
    }

    /// Reproducible random grid.
    pub fn seeded(rows: usize, cols: usize, density: f64, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self::random_with_density(rows, cols, density, &mut rng)
    }

    /// Build a grid from explicit rows. Non-zero entries are alive.
    ///
    /// # Panics
    /// Panics if the rows are ragged.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            assert_eq!(row.len(), cols, "row {y} has {} cells, expected {cols}", row.len());
            cells.extend(row.iter().map(|&c| (c != DEAD) as u8));
        }
        Self {
            cells,
            rows: rows.len(),
            cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row},{col}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[self.idx(row, col)]
    }

    #[inline]
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == ALIVE
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let i = self.idx(row, col);
        self.cells[i] = alive as u8;
    }

    /// Number of live cells.
    pub fn population(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    /// Live-neighbor count of `(row, col)` with toroidal wrap, in `0..=8`.
    #[inline]
    pub fn neighbor_count(&self, row: usize, col: usize) -> u8 {
        debug_assert!(row < self.rows && col < self.cols);
        neighbor_count_in(&self.cells, self.rows, self.cols, row, col)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Iterate rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u8]> {
        // `chunks_exact(0)` panics, and a zero-column grid has no rows to show.
        self.cells.chunks_exact(self.cols.max(1)).take(self.rows)
    }
}

/// Toroidal live-neighbor count over a raw row-major buffer.
///
/// Indices are wrapped with `+ len - 1` rather than signed arithmetic so the
/// hot loop stays in `usize`.
#[inline(always)]
pub(crate) fn neighbor_count_in(
    cells: &[u8],
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> u8 {
    let up = (row + rows - 1) % rows;
    let down = (row + 1) % rows;
    let left = (col + cols - 1) % cols;
    let right = (col + 1) % cols;

    let above = up * cols;
    let here = row * cols;
    let below = down * cols;

    cells[above + left]
        + cells[above + col]
        + cells[above + right]
        + cells[here + left]
        + cells[here + right]
        + cells[below + left]
        + cells[below + col]
        + cells[below + right]
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            let mut first = true;
            for &cell in row {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{cell}")?;
                first = false;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}", self.rows, self.cols)?;
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseGridError {
    #[error("grid text contains no rows")]
    Empty,
    #[error("unexpected token {token:?} at line {line}, expected 0 or 1")]
    BadToken { line: usize, token: String },
    #[error("line {line} has {found} cells, expected {expected}")]
    Ragged {
        line: usize,
        found: usize,
        expected: usize,
    },
}

/// Parses the same text that `Display` emits. Blank lines are skipped.
impl FromStr for Grid {
    type Err = ParseGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = Vec::new();
        let mut rows = 0usize;
        let mut cols = None;

        for (line_no, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut width = 0usize;
            for token in line.split_whitespace() {
                let cell = match token {
                    "0" => DEAD,
                    "1" => ALIVE,
                    other => {
                        return Err(ParseGridError::BadToken {
                            line: line_no + 1,
                            token: other.to_string(),
                        });
                    }
                };
                cells.push(cell);
                width += 1;
            }
            match cols {
                None => cols = Some(width),
                Some(expected) if expected != width => {
                    return Err(ParseGridError::Ragged {
                        line: line_no + 1,
                        found: width,
                        expected,
                    });
                }
                Some(_) => {}
            }
            rows += 1;
        }

        let cols = cols.ok_or(ParseGridError::Empty)?;
        Ok(Self { cells, rows, cols })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::{Grid, ParseGridError};

    fn grid_with(rows: usize, cols: usize, live: &[(usize, usize)]) -> Grid {
        let mut grid = Grid::new(rows, cols);
        for &(r, c) in live {
            grid.set(r, c, true);
        }
        grid
    }

    #[test]
    fn corners_see_opposite_edges() {
        let (rows, cols) = (5, 7);
        // (0,0)'s wrapped neighbors.
        let grid = grid_with(rows, cols, &[(rows - 1, cols - 1), (rows - 1, 0), (0, cols - 1)]);
        assert_eq!(grid.neighbor_count(0, 0), 3);

        let grid = grid_with(rows, cols, &[(0, 0), (rows - 1, 0), (rows - 1, cols - 2)]);
        assert_eq!(grid.neighbor_count(0, cols - 1), 3);

        let grid = grid_with(rows, cols, &[(0, 0), (0, 1), (rows - 1, cols - 1)]);
        assert_eq!(grid.neighbor_count(rows - 1, 0), 3);

        let grid = grid_with(rows, cols, &[(0, 0), (0, cols - 1), (rows - 1, 0)]);
        assert_eq!(grid.neighbor_count(rows - 1, cols - 1), 3);
    }

    #[test]
    fn neighbor_count_excludes_self_and_caps_at_eight() {
        let mut grid = Grid::new(4, 4);
        for r in 0..4 {
            for c in 0..4 {
                grid.set(r, c, true);
            }
        }
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(grid.neighbor_count(r, c), 8, "cell ({r},{c})");
            }
        }
        let single = grid_with(4, 4, &[(2, 2)]);
        assert_eq!(single.neighbor_count(2, 2), 0);
    }

    #[test]
    fn tiny_torus_counts_wrapped_duplicates() {
        // On a 1x1 torus every neighbor offset lands on the cell itself.
        let grid = grid_with(1, 1, &[(0, 0)]);
        assert_eq!(grid.neighbor_count(0, 0), 8);
    }

    #[test]
    fn seeded_grid_is_reproducible() {
        let a = Grid::seeded(16, 16, 0.5, 0xC0FFEE);
        let b = Grid::seeded(16, 16, 0.5, 0xC0FFEE);
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|&c| c <= 1));
    }

    #[test]
    fn random_grid_has_requested_shape() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let grid = Grid::random(4, 5, &mut rng);
        assert_eq!((grid.rows(), grid.cols()), (4, 5));
        assert_eq!(grid.iter_rows().count(), 4);
        assert!(grid.population() <= 20);
    }

    #[test]
    fn density_extremes() {
        assert_eq!(Grid::seeded(8, 8, 0.0, 1).population(), 0);
        assert_eq!(Grid::seeded(8, 8, 1.0, 1).population(), 64);
    }

    #[test]
    fn display_then_parse() {
        let grid = grid_with(3, 4, &[(0, 1), (2, 3)]);
        let text = grid.to_string();
        assert_eq!(text, "0 1 0 0\n0 0 0 0\n0 0 0 1\n");
        assert_eq!(text.parse::<Grid>(), Ok(grid));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!("".parse::<Grid>(), Err(ParseGridError::Empty));
        assert_eq!(
            "0 1\n0 2\n".parse::<Grid>(),
            Err(ParseGridError::BadToken {
                line: 2,
                token: "2".to_string()
            })
        );
        assert_eq!(
            "0 1\n0\n".parse::<Grid>(),
            Err(ParseGridError::Ragged {
                line: 2,
                found: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn from_rows_normalizes_nonzero_cells() {
        let grid = Grid::from_rows(&[[0u8, 7], [1, 0]]);
        assert_eq!(grid.as_slice(), &[0, 1, 1, 0]);
        assert_eq!(grid.population(), 2);
    }
}
