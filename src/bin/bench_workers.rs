use std::time::Instant;

use band_life::bandlife::stepper::run_rayon;
use band_life::{BandLife, Grid, LifeConfig, TimingMode};

const SEED: u64 = 0x5EED_1234_ABCD_EF01;
const LIVE_DENSITY: f64 = 0.42;

fn bench_banded(grid: &Grid, workers: usize, iterations: u64) -> (f64, f64) {
    let engine = BandLife::with_config(
        LifeConfig::default()
            .workers(workers)
            .timing(TimingMode::BarrierToBarrier),
    );
    let start = Instant::now();
    let report = engine
        .run(grid.clone(), iterations)
        .expect("banded run failed");
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    let avg_ms = report.average_generation_time().as_secs_f64() * 1000.0;
    (total_ms, avg_ms)
}

fn bench_rayon(grid: &Grid, iterations: u64) -> f64 {
    let start = Instant::now();
    std::hint::black_box(run_rayon(grid, iterations));
    start.elapsed().as_secs_f64() * 1000.0
}

fn main() {
    let scales: &[(usize, u64)] = &[(64, 2_000), (256, 500), (1024, 50), (2048, 20)];
    let max_workers = num_cpus::get().max(1);
    let worker_counts: Vec<usize> = [1usize, 2, 4, 8, 16]
        .into_iter()
        .filter(|&w| w <= max_workers)
        .collect();

    println!(
        "{:<10} {:>8} {:>8} {:>12} {:>12}",
        "Grid", "Workers", "Iters", "Total(ms)", "Avg(ms)"
    );
    println!("{}", "-".repeat(54));

    for &(size, iters) in scales {
        let grid = Grid::seeded(size, size, LIVE_DENSITY, SEED);
        for &workers in &worker_counts {
            let (total_ms, avg_ms) = bench_banded(&grid, workers, iters);
            println!(
                "{:<10} {:>8} {:>8} {:>12.1} {:>12.4}",
                format!("{size}x{size}"),
                workers,
                iters,
                total_ms,
                avg_ms
            );
        }
        let rayon_ms = bench_rayon(&grid, iters);
        println!(
            "{:<10} {:>8} {:>8} {:>12.1} {:>12.4}",
            format!("{size}x{size}"),
            "rayon",
            iters,
            rayon_ms,
            rayon_ms / iters as f64
        );
    }
}
