use std::io;
use std::time::Duration;

use thiserror::Error;

use super::barrier::BarrierError;

#[derive(Debug, Error)]
pub enum LifeError {
    #[error("grid has no cells ({rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("failed to spawn worker {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
    #[error("barrier timed out after {timeout:?} at generation {generation}")]
    BarrierTimeout { generation: u64, timeout: Duration },
    #[error("generation barrier was broken")]
    BarrierBroken,
}

impl From<BarrierError> for LifeError {
    fn from(err: BarrierError) -> Self {
        match err {
            BarrierError::Broken => LifeError::BarrierBroken,
            BarrierError::Timeout {
                generation,
                timeout,
            } => LifeError::BarrierTimeout {
                generation,
                timeout,
            },
        }
    }
}
