//! Single-threaded double-buffered solver.
//!
//! This is the behavioural baseline the threaded backends are tested
//! against: one pass reads only the previous buffer, so results are fully
//! deterministic for a given input grid.

use num::Float;

use gridrelax_concepts::{four_point_average, ConvergencePolicy, Grid, RoundConvergence};

use crate::backend::{RelaxError, RelaxOutcome};
use crate::time::RoundCounter;

/// Relaxes the grid on the calling thread until a full pass stays below
/// `precision` or the optional round cap is hit.
pub fn relax_reference<F>(
    grid: Grid<F>,
    precision: F,
    max_rounds: Option<usize>,
) -> Result<RelaxOutcome<F>, RelaxError>
where
    F: Float,
{
    let mut current = grid;
    let mut next = current.clone();
    let mut policy = RoundConvergence::new(precision);
    let mut counter = RoundCounter::new(max_rounds);
    loop {
        if !counter.advance() {
            return Ok(RelaxOutcome {
                grid: current,
                rounds: counter.round() - 1,
                converged: false,
            });
        }
        policy.begin_pass();
        for (row, col) in current.interior() {
            let value = four_point_average(&current, row, col);
            policy.observe((value - current.get(row, col)).abs());
            next.set(row, col, value);
        }
        std::mem::swap(&mut current, &mut next);
        if policy.converged() {
            return Ok(RelaxOutcome {
                grid: current,
                rounds: counter.round(),
                converged: true,
            });
        }
    }
}
