//! Row-band partitioning of the grid across workers.

use std::ops::Range;

/// Half-open range of rows `[start, end)` owned by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBand {
    pub start: usize,
    pub end: usize,
}

impl RowBand {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Flat cell range of this band in a row-major buffer with `cols` columns.
    #[inline]
    pub fn cell_range(&self, cols: usize) -> Range<usize> {
        self.start * cols..self.end * cols
    }
}

/// Split `rows` into `workers` contiguous bands.
///
/// Every band gets `rows / workers` rows and the last band absorbs the
/// remainder. With more workers than rows the leading bands are empty.
///
/// # Panics
/// Panics if `workers == 0`.
pub fn partition_rows(rows: usize, workers: usize) -> Vec<RowBand> {
    assert!(workers > 0, "partition requires at least one worker");
    let chunk = rows / workers;
    (0..workers)
        .map(|i| {
            let start = i * chunk;
            let end = if i == workers - 1 { rows } else { start + chunk };
            RowBand { start, end }
        })
        .collect()
}
