//! Transition function for B3/S23.

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

/// Next state of a cell given its current state and live-neighbor count.
///
/// A live cell survives with two or three neighbors; a dead cell is born with
/// exactly three. Everything else is dead in the next generation.
#[inline(always)]
pub fn apply_rule(state: u8, neighbors: u8) -> u8 {
    let next_alive = if state == ALIVE {
        neighbors == 2 || neighbors == 3
    } else {
        neighbors == 3
    };
    next_alive as u8
}
