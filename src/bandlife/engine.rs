//! Barrier-synchronized banded engine.
//!
//! A run spawns one scoped worker per row band. Every generation each worker
//! fills its band of the `next` buffer from the full `live` buffer, then
//! arrives at the generation barrier. The last arrival copies `next` into
//! `live` and records the timing sample while still holding the barrier lock,
//! then releases everyone into the following generation.

use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::barrier::{BarrierError, CyclicBarrier};
use super::error::LifeError;
use super::grid::Grid;
use super::partition::{RowBand, partition_rows};
use super::stepper::step_band;

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

/// Auto worker count: one per physical core, never more than there are rows.
#[inline]
fn auto_worker_count_for(physical: usize, rows: usize) -> usize {
    physical.max(1).min(rows.max(1))
}

/// What a generation's timing sample measures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimingMode {
    /// From the committing worker's own compute start to the end of its
    /// commit. Understates the generation when bands are unevenly loaded.
    #[default]
    LastArrival,
    /// From the previous release (or run start) to the end of this commit.
    BarrierToBarrier,
}

/// Configuration for a banded engine.
///
/// Use `LifeConfig::default()` for auto-detected workers and last-arrival
/// timing, or adjust individual knobs via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct LifeConfig {
    /// Size of the worker pool.
    /// `None` means one worker per physical core, capped at the row count.
    pub workers: Option<usize>,
    pub timing: TimingMode,
    /// Upper bound on a single barrier wait. `None` waits forever.
    pub barrier_timeout: Option<Duration>,
}

impl LifeConfig {
    /// Set an explicit worker count. Zero is rejected when the run starts.
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn timing(mut self, mode: TimingMode) -> Self {
        self.timing = mode;
        self
    }

    pub fn barrier_timeout(mut self, timeout: Duration) -> Self {
        self.barrier_timeout = Some(timeout);
        self
    }

    fn resolve_workers(&self, rows: usize) -> usize {
        self.workers
            .unwrap_or_else(|| auto_worker_count_for(physical_core_count(), rows))
    }
}

/// One duration per committed generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationTimings {
    samples: Vec<Duration>,
}

impl GenerationTimings {
    fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    /// Mean sample, zero when nothing was recorded.
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let nanos = self.total().as_nanos() / self.samples.len() as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    pub fn min(&self) -> Option<Duration> {
        self.samples.iter().copied().min()
    }

    pub fn max(&self) -> Option<Duration> {
        self.samples.iter().copied().max()
    }
}

/// Outcome of [`BandLife::run`].
#[derive(Clone, Debug)]
pub struct RunReport {
    pub grid: Grid,
    pub timings: GenerationTimings,
    pub workers: usize,
    pub bands: Vec<RowBand>,
}

impl RunReport {
    pub fn average_generation_time(&self) -> Duration {
        self.timings.average()
    }
}

/// Raw views of the two generation buffers, shared by every worker.
///
/// Access is coordinated by the barrier protocol rather than by the type
/// system: during compute, `live` is only read and each worker writes only its
/// own band of `next`; the commit runs on the leader while every other worker
/// is parked at the barrier.
#[derive(Clone, Copy)]
struct GenerationBuffers {
    live: *mut u8,
    next: *mut u8,
    rows: usize,
    cols: usize,
}

// SAFETY: the pointers are only dereferenced under the phase discipline
// documented on the type, and both buffers outlive the worker scope.
unsafe impl Send for GenerationBuffers {}
unsafe impl Sync for GenerationBuffers {}

impl GenerationBuffers {
    #[inline]
    fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// # Safety
    /// No thread may write `live` or the cells of `band` in `next` until this
    /// returns, and no two concurrent callers may pass overlapping bands.
    #[inline]
    unsafe fn compute_band(&self, band: RowBand) {
        unsafe {
            let live = std::slice::from_raw_parts(self.live as *const u8, self.len());
            let range = band.cell_range(self.cols);
            let next =
                std::slice::from_raw_parts_mut(self.next.add(range.start), range.end - range.start);
            step_band(live, next, self.rows, self.cols, band);
        }
    }

    /// # Safety
    /// Caller must be the only thread touching either buffer.
    #[inline]
    unsafe fn commit(&self) {
        unsafe {
            std::ptr::copy_nonoverlapping(self.next as *const u8, self.live, self.len());
        }
    }
}

/// Payload mutated by the last arrival of each generation.
struct CommitLog {
    mode: TimingMode,
    timings: GenerationTimings,
    released_at: Instant,
}

impl CommitLog {
    fn record(&mut self, compute_started: Instant) {
        let now = Instant::now();
        let sample = match self.mode {
            TimingMode::LastArrival => now.duration_since(compute_started),
            TimingMode::BarrierToBarrier => now.duration_since(self.released_at),
        };
        self.timings.samples.push(sample);
        self.released_at = now;
    }
}

/// Breaks the barrier if the owning worker unwinds, so its peers stop
/// waiting for an arrival that will never come.
struct BreakOnUnwind<'a, S>(&'a CyclicBarrier<S>);

impl<S> Drop for BreakOnUnwind<'_, S> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.break_barrier();
        }
    }
}

struct WorkerContext<'a> {
    buffers: GenerationBuffers,
    barrier: &'a CyclicBarrier<CommitLog>,
    steps: u64,
    barrier_timeout: Option<Duration>,
}

fn run_worker(ctx: &WorkerContext<'_>, worker: usize, band: RowBand) -> Result<(), BarrierError> {
    debug!(worker, start = band.start, end = band.end, "worker started");

    for generation in 0..ctx.steps {
        let compute_started = Instant::now();
        // SAFETY: bands are disjoint, and the barrier keeps every worker out
        // of this call while the leader commits.
        unsafe { ctx.buffers.compute_band(band) };

        let buffers = ctx.buffers;
        ctx.barrier
            .arrive_timeout(ctx.barrier_timeout, |log| {
                // SAFETY: every other worker has arrived and is parked on the
                // barrier lock we hold, so nothing else touches the buffers.
                unsafe { buffers.commit() };
                log.record(compute_started);
                trace!(worker, generation, "committed generation");
            })
            .inspect_err(|err| debug!(worker, generation, %err, "worker leaving barrier"))?;
    }

    debug!(worker, "worker finished");
    Ok(())
}

/// Fixed-pool engine that advances a toroidal grid generation by generation.
pub struct BandLife {
    config: LifeConfig,
}

impl Default for BandLife {
    fn default() -> Self {
        Self::new()
    }
}

impl BandLife {
    pub fn new() -> Self {
        Self::with_config(LifeConfig::default())
    }

    pub fn with_config(config: LifeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    /// Advance `grid` by `steps` generations.
    ///
    /// Blocks until every worker has been joined. Preconditions are checked
    /// before any thread is spawned.
    pub fn run(&self, mut grid: Grid, steps: u64) -> Result<RunReport, LifeError> {
        let (rows, cols) = (grid.rows(), grid.cols());
        if grid.is_empty() {
            return Err(LifeError::EmptyGrid { rows, cols });
        }
        let workers = self.config.resolve_workers(rows);
        if workers == 0 {
            return Err(LifeError::NoWorkers);
        }

        let bands = partition_rows(rows, workers);
        let idle = bands.iter().filter(|b| b.is_empty()).count();
        if idle > 0 {
            warn!(workers, rows, idle, "more workers than rows; idle workers still join the barrier");
        }

        if steps == 0 {
            return Ok(RunReport {
                grid,
                timings: GenerationTimings::default(),
                workers,
                bands,
            });
        }

        info!(rows, cols, steps, workers, timing = ?self.config.timing, "starting run");
        let started = Instant::now();

        let mut next = grid.as_slice().to_vec();
        let buffers = GenerationBuffers {
            live: grid.as_mut_slice().as_mut_ptr(),
            next: next.as_mut_ptr(),
            rows,
            cols,
        };
        let barrier = CyclicBarrier::new(
            workers,
            CommitLog {
                mode: self.config.timing,
                timings: GenerationTimings::with_capacity(steps.try_into().unwrap_or(0)),
                released_at: Instant::now(),
            },
        );
        let ctx = WorkerContext {
            buffers,
            barrier: &barrier,
            steps,
            barrier_timeout: self.config.barrier_timeout,
        };

        let outcome = drive_workers(&ctx, &bands, run_worker);

        drop(next);
        outcome?;

        let timings = barrier.into_inner().timings;
        info!(
            elapsed = ?started.elapsed(),
            average = ?timings.average(),
            population = grid.population(),
            "run finished"
        );

        Ok(RunReport {
            grid,
            timings,
            workers,
            bands,
        })
    }
}

/// Spawn one scoped thread per band running `body`, join them all and fold
/// their exits into a single result.
fn drive_workers<'env, F>(ctx: &WorkerContext<'env>, bands: &[RowBand], body: F) -> Result<(), LifeError>
where
    F: Fn(&WorkerContext<'env>, usize, RowBand) -> Result<(), BarrierError> + Sync,
{
    let body = &body;
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(bands.len());
        for (worker, &band) in bands.iter().enumerate() {
            let spawned = thread::Builder::new()
                .name(format!("band-life-{worker}"))
                .spawn_scoped(s, move || {
                    let _guard = BreakOnUnwind(ctx.barrier);
                    body(ctx, worker, band)
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // The barrier can never fill; release whoever started.
                    ctx.barrier.break_barrier();
                    for (started, handle) in handles.into_iter().enumerate() {
                        match handle.join() {
                            Ok(Ok(())) => {}
                            Ok(Err(err)) => debug!(worker = started, %err, "worker released after failed spawn"),
                            Err(_) => warn!(worker = started, "worker panicked after failed spawn"),
                        }
                    }
                    return Err(LifeError::Spawn { worker, source });
                }
            }
        }
        collect_outcome(handles.into_iter().map(|h| h.join()))
    })
}

/// Fold every worker's exit into one result. A panic outranks a timeout,
/// which outranks the broken-barrier errors it causes in the other workers.
fn collect_outcome<I>(joined: I) -> Result<(), LifeError>
where
    I: IntoIterator<Item = thread::Result<Result<(), BarrierError>>>,
{
    let mut panicked = None;
    let mut timed_out = None;
    let mut broken = false;

    for (worker, result) in joined.into_iter().enumerate() {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err @ BarrierError::Timeout { .. })) => {
                timed_out.get_or_insert(err);
            }
            Ok(Err(BarrierError::Broken)) => broken = true,
            Err(_) => {
                panicked.get_or_insert(worker);
            }
        }
    }

    if let Some(worker) = panicked {
        return Err(LifeError::WorkerPanicked { worker });
    }
    if let Some(err) = timed_out {
        return Err(err.into());
    }
    if broken {
        return Err(LifeError::BarrierBroken);
    }
    Ok(())
}

/// Run `steps` generations with `workers` threads and return the final grid
/// and the average generation time.
pub fn run(grid: Grid, steps: u64, workers: usize) -> Result<(Grid, Duration), LifeError> {
    let report = BandLife::with_config(LifeConfig::default().workers(workers)).run(grid, steps)?;
    let average = report.average_generation_time();
    Ok((report.grid, average))
}
