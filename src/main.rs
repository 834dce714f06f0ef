#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::Duration;

use anyhow::{Context, Result};
use band_life::bandlife::grid::DEFAULT_DENSITY;
use band_life::{BandLife, Grid, LifeConfig, TimingMode};
use clap::builder::TypedValueParser;
use clap::{Parser, ValueEnum};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ROWS: usize = 10;
const DEFAULT_COLS: usize = 10;
const DEFAULT_STEPS: u64 = 10_000;
const DEFAULT_WORKERS: usize = 4;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TimingArg {
    /// Committing worker's compute plus commit.
    LastArrival,
    /// Release to release, covering the slowest band.
    Barrier,
}

impl From<TimingArg> for TimingMode {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::LastArrival => TimingMode::LastArrival,
            TimingArg::Barrier => TimingMode::BarrierToBarrier,
        }
    }
}

/// Run a toroidal Game of Life split into row bands across a worker pool.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Grid height.
    #[arg(
        long,
        env = "BAND_LIFE_ROWS",
        default_value_t = DEFAULT_ROWS,
        value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize)
    )]
    rows: usize,
    /// Grid width.
    #[arg(
        long,
        env = "BAND_LIFE_COLS",
        default_value_t = DEFAULT_COLS,
        value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize)
    )]
    cols: usize,
    /// Number of generations to run.
    #[arg(long, env = "BAND_LIFE_STEPS", default_value_t = DEFAULT_STEPS)]
    steps: u64,
    /// Worker pool size.
    #[arg(
        long,
        env = "BAND_LIFE_WORKERS",
        default_value_t = DEFAULT_WORKERS,
        value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize)
    )]
    workers: usize,
    /// Seed for the initial state. Random when omitted.
    #[arg(long, env = "BAND_LIFE_SEED")]
    seed: Option<u64>,
    /// Probability that an initial cell is alive.
    #[arg(long, default_value_t = DEFAULT_DENSITY, value_parser = parse_density)]
    density: f64,
    /// What each per-generation timing sample measures.
    #[arg(long, value_enum, default_value_t = TimingArg::LastArrival)]
    timing: TimingArg,
    /// Abort the run if a worker waits longer than this at the barrier.
    #[arg(long, value_name = "MILLISECONDS")]
    barrier_timeout_ms: Option<u64>,
    /// Skip printing the initial and final grids.
    #[arg(short, long)]
    quiet: bool,
    /// Log verbosity: -v for debug, -vv for trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_density(value: &str) -> Result<f64, String> {
    let density: f64 = value
        .parse()
        .map_err(|_| format!("{value:?} is not a number"))?;
    if (0.0..=1.0).contains(&density) {
        Ok(density)
    } else {
        Err(format!("density must be within 0..=1, got {density}"))
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install subscriber")
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, density = args.density, "seeding initial grid");
    let grid = Grid::seeded(args.rows, args.cols, args.density, seed);

    if !args.quiet {
        println!("Initial state:");
        print!("{grid}");
    }

    let mut config = LifeConfig::default()
        .workers(args.workers)
        .timing(args.timing.into());
    if let Some(ms) = args.barrier_timeout_ms {
        config = config.barrier_timeout(Duration::from_millis(ms));
    }

    let report = BandLife::with_config(config)
        .run(grid, args.steps)
        .context("simulation failed")?;

    if !args.quiet {
        println!("\nSimulation completed:");
        print!("{}", report.grid);
    }
    println!("\nAverage step time: {:?}", report.average_generation_time());
    Ok(())
}
