//! Banded engine internals and public API.

pub mod barrier;
mod engine;
mod error;
pub mod grid;
pub mod partition;
pub mod rules;
pub mod stepper;

pub use barrier::{Arrival, BarrierError, CyclicBarrier};
pub use engine::{BandLife, GenerationTimings, LifeConfig, RunReport, TimingMode, run};
pub use error::LifeError;
pub use grid::{Grid, ParseGridError};
pub use partition::{RowBand, partition_rows};
pub use rules::apply_rule;
