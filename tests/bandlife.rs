use std::collections::HashSet;

use band_life::bandlife::run;
use band_life::{BandLife, Grid, LifeConfig};
use rand::Rng;
use rand::SeedableRng;

fn grid_with(rows: usize, cols: usize, cells: &[(usize, usize)]) -> Grid {
    let mut grid = Grid::new(rows, cols);
    for &(r, c) in cells {
        grid.set(r, c, true);
    }
    grid
}

fn collect_live(grid: &Grid) -> HashSet<(usize, usize)> {
    let mut out = HashSet::new();
    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            if grid.is_alive(r, c) {
                out.insert((r, c));
            }
        }
    }
    out
}

fn step_naive(cells: &HashSet<(usize, usize)>, rows: usize, cols: usize) -> HashSet<(usize, usize)> {
    let mut next = HashSet::new();
    for r in 0..rows {
        for c in 0..cols {
            let mut neighbors = 0;
            for dr in [rows - 1, 0, 1] {
                for dc in [cols - 1, 0, 1] {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    if cells.contains(&((r + dr) % rows, (c + dc) % cols)) {
                        neighbors += 1;
                    }
                }
            }
            let alive = cells.contains(&(r, c));
            let next_alive = if alive {
                neighbors == 2 || neighbors == 3
            } else {
                neighbors == 3
            };
            if next_alive {
                next.insert((r, c));
            }
        }
    }
    next
}

#[test]
fn all_dead_stays_dead() {
    let grid = Grid::new(3, 3);
    for steps in [1u64, 2, 7, 50] {
        let (out, _) = run(grid.clone(), steps, 3).unwrap();
        assert_eq!(out, grid, "steps={steps}");
    }
}

#[test]
fn lone_cell_dies_after_one_step() {
    let grid = grid_with(3, 3, &[(1, 1)]);
    let (out, _) = run(grid, 1, 3).unwrap();
    assert_eq!(out.population(), 0);
    assert_eq!(out, Grid::new(3, 3));
}

#[test]
fn block_is_stable_across_band_boundary() {
    // Rows 3 and 4 fall in different bands with four workers on 8 rows.
    let block = [(3, 3), (3, 4), (4, 3), (4, 4)];
    let grid = grid_with(8, 8, &block);
    let (out, _) = run(grid.clone(), 6, 4).unwrap();
    assert_eq!(out, grid);
}

#[test]
fn blinker_wraps_over_the_seam() {
    // Vertical blinker centred on row 0 straddles the first and last bands.
    let vertical = grid_with(6, 6, &[(5, 2), (0, 2), (1, 2)]);
    let horizontal = grid_with(6, 6, &[(0, 1), (0, 2), (0, 3)]);

    let (one, _) = run(vertical.clone(), 1, 3).unwrap();
    assert_eq!(one, horizontal);
    let (two, _) = run(vertical.clone(), 2, 3).unwrap();
    assert_eq!(two, vertical);
}

#[test]
fn glider_returns_home_after_circling_the_torus() {
    let glider = [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)];
    let grid = grid_with(8, 8, &glider);

    let (quarter, _) = run(grid.clone(), 4, 4).unwrap();
    let shifted: Vec<_> = glider.iter().map(|&(r, c)| (r + 1, c + 1)).collect();
    assert_eq!(quarter, grid_with(8, 8, &shifted));

    // One cell diagonal per four generations: 8 * 4 brings it back.
    let (home, _) = run(grid.clone(), 32, 4).unwrap();
    assert_eq!(home, grid);
}

#[test]
fn matches_naive_on_small_random_seed() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xBADC0FFEE);
    let (rows, cols) = (17, 13);
    let mut grid = Grid::new(rows, cols);
    let mut naive = HashSet::new();
    for r in 0..rows {
        for c in 0..cols {
            if rng.random::<f64>() < 0.33 {
                grid.set(r, c, true);
                naive.insert((r, c));
            }
        }
    }

    let engine = BandLife::with_config(LifeConfig::default().workers(5));
    for _ in 0..8 {
        assert_eq!(collect_live(&grid), naive);
        grid = engine.run(grid, 1).unwrap().grid;
        naive = step_naive(&naive, rows, cols);
    }
}

#[test]
fn default_config_auto_detects_workers() {
    let grid = Grid::seeded(12, 12, 0.5, 21);
    let report = BandLife::new().run(grid, 3).unwrap();
    assert!(report.workers >= 1 && report.workers <= 12);
    assert_eq!(report.bands.len(), report.workers);
    assert_eq!(report.timings.len(), 3);
}

#[test]
fn rendered_output_uses_space_separated_tokens() {
    let grid = grid_with(2, 3, &[(0, 0), (1, 2)]);
    assert_eq!(grid.to_string(), "1 0 0\n0 0 1\n");
}
