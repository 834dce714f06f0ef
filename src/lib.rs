//! Row-banded, barrier-synchronized Conway's Game of Life (B3/S23) on a torus.

pub mod bandlife;
pub use bandlife::{BandLife, Grid, LifeConfig, LifeError, RunReport, TimingMode};
