//! Reusable generation barrier with a last-arrival action.
//!
//! A [`CyclicBarrier`] counts arrivals under a single mutex. The participant
//! whose arrival brings the count to `parties` is the leader for that
//! generation: it runs the supplied action on the shared payload while still
//! holding the lock, resets the count, advances the generation and wakes the
//! followers. Followers sleep until the generation they arrived in has ended.
//!
//! The barrier can be broken, either explicitly (a participant is going away)
//! or by a follower whose bounded wait expired. A broken barrier never blocks
//! again; every pending and future arrival returns an error.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BarrierError {
    #[error("barrier was broken by another participant")]
    Broken,
    #[error("timed out after {timeout:?} waiting at generation {generation}")]
    Timeout { generation: u64, timeout: Duration },
}

/// Role a participant played in one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Last to arrive; ran the commit action.
    Leader,
    /// Waited and was released by the leader.
    Follower,
}

/// The tie-break for who commits: the arrival that observes the counter equal
/// to the party count. Exactly one arrival per generation satisfies this.
#[inline]
pub fn is_last_arrival(arrived: usize, parties: usize) -> bool {
    arrived == parties
}

struct BarrierState<S> {
    arrived: usize,
    generation: u64,
    broken: bool,
    shared: S,
}

pub struct CyclicBarrier<S> {
    parties: usize,
    state: Mutex<BarrierState<S>>,
    released: Condvar,
}

impl<S> CyclicBarrier<S> {
    /// # Panics
    /// Panics if `parties == 0`.
    pub fn new(parties: usize, shared: S) -> Self {
        assert!(parties > 0, "barrier requires at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                broken: false,
                shared,
            }),
            released: Condvar::new(),
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Number of completed generations.
    pub fn generation(&self) -> u64 {
        self.lock_unpoisoned().generation
    }

    pub fn is_broken(&self) -> bool {
        self.lock_unpoisoned().broken
    }

    /// Arrive and wait without a deadline.
    pub fn arrive<F>(&self, on_last: F) -> Result<Arrival, BarrierError>
    where
        F: FnOnce(&mut S),
    {
        self.arrive_timeout(None, on_last)
    }

    /// Arrive at the barrier. The leader runs `on_last`; followers drop it.
    ///
    /// With `Some(timeout)`, a follower that is not released in time breaks
    /// the barrier and returns [`BarrierError::Timeout`].
    pub fn arrive_timeout<F>(
        &self,
        timeout: Option<Duration>,
        on_last: F,
    ) -> Result<Arrival, BarrierError>
    where
        F: FnOnce(&mut S),
    {
        let mut state = self.state.lock().map_err(|_| BarrierError::Broken)?;
        if state.broken {
            return Err(BarrierError::Broken);
        }

        state.arrived += 1;
        debug_assert!(state.arrived <= self.parties);
        if is_last_arrival(state.arrived, self.parties) {
            on_last(&mut state.shared);
            state.arrived = 0;
            state.generation += 1;
            drop(state);
            self.released.notify_all();
            return Ok(Arrival::Leader);
        }

        let generation = state.generation;
        let pending = |s: &mut BarrierState<S>| s.generation == generation && !s.broken;
        let state = match timeout {
            None => self
                .released
                .wait_while(state, pending)
                .map_err(|_| BarrierError::Broken)?,
            Some(timeout) => {
                let (mut state, result) = self
                    .released
                    .wait_timeout_while(state, timeout, pending)
                    .map_err(|_| BarrierError::Broken)?;
                if result.timed_out() {
                    state.broken = true;
                    drop(state);
                    self.released.notify_all();
                    return Err(BarrierError::Timeout {
                        generation,
                        timeout,
                    });
                }
                state
            }
        };

        if state.generation != generation {
            Ok(Arrival::Follower)
        } else {
            Err(BarrierError::Broken)
        }
    }

    /// Mark the barrier broken and wake every waiter.
    pub fn break_barrier(&self) {
        let mut state = self.lock_unpoisoned();
        state.broken = true;
        drop(state);
        self.released.notify_all();
    }

    /// Consume the barrier and hand back the shared payload.
    pub fn into_inner(self) -> S {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .shared
    }

    fn lock_unpoisoned(&self) -> MutexGuard<'_, BarrierState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
