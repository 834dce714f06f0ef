//! Single-call generation steppers.
//!
//! `step_band` is the per-band kernel shared by every engine. The sequential
//! and rayon steppers apply it to the whole grid and serve as the baseline the
//! banded engine is checked against.

use rayon::prelude::*;

use super::grid::{Grid, neighbor_count_in};
use super::partition::RowBand;
use super::rules::apply_rule;

/// Compute `band` of the next generation.
///
/// `live` is the full current grid; `next_band` holds only the band's rows,
/// so `next_band[0]` is cell `(band.start, 0)`.
#[inline]
pub fn step_band(live: &[u8], next_band: &mut [u8], rows: usize, cols: usize, band: RowBand) {
    debug_assert_eq!(live.len(), rows * cols);
    debug_assert_eq!(next_band.len(), band.len() * cols);

    for (row, out) in band.rows().zip(next_band.chunks_exact_mut(cols.max(1))) {
        let base = row * cols;
        for (col, cell) in out.iter_mut().enumerate() {
            let neighbors = neighbor_count_in(live, rows, cols, row, col);
            *cell = apply_rule(live[base + col], neighbors);
        }
    }
}

pub fn step_sequential(grid: &Grid) -> Grid {
    let mut next = grid.clone();
    let (rows, cols) = (grid.rows(), grid.cols());
    step_band(
        grid.as_slice(),
        next.as_mut_slice(),
        rows,
        cols,
        RowBand { start: 0, end: rows },
    );
    next
}

/// One generation with rows distributed over the global rayon pool.
pub fn step_rayon(grid: &Grid) -> Grid {
    let mut next = grid.clone();
    if grid.is_empty() {
        return next;
    }
    let (rows, cols) = (grid.rows(), grid.cols());
    let live = grid.as_slice();
    next.as_mut_slice()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, out)| {
            step_band(live, out, rows, cols, RowBand { start: row, end: row + 1 });
        });
    next
}

pub fn run_sequential(grid: &Grid, steps: u64) -> Grid {
    let mut current = grid.clone();
    for _ in 0..steps {
        current = step_sequential(&current);
    }
    current
}

pub fn run_rayon(grid: &Grid, steps: u64) -> Grid {
    let mut current = grid.clone();
    for _ in 0..steps {
        current = step_rayon(&current);
    }
    current
}
