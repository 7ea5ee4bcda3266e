//! The execution backends carrying out a relaxation run.

use serde::{Deserialize, Serialize};

use gridrelax_concepts::Grid;

use crate::config::{BackendChoice, RelaxSettings};

/// Free-running sweeps over a shared grid with a per-cell lock table.
///
/// Every worker repeatedly averages all interior cells in place and exits
/// on its own quiet streak, so the number of sweeps and the exact result
/// depend on thread interleaving.
pub mod lockcell;

/// Lockstep barrier rounds over row bands with a shared double buffer per
/// band edge. Deterministic: the result equals the single-threaded
/// reference solver.
pub mod jacobi;

/// Message-passing row bands with halo exchange over [crossbeam_channel]
/// and a per-round convergence coordinator. Deterministic like
/// [jacobi](crate::backend::jacobi) but with no shared memory at all.
pub mod banded;

mod errors;

pub use errors::RelaxError;

/// Result of a completed relaxation run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RelaxOutcome<F = f64> {
    /// The relaxed grid; border cells are bitwise identical to the input.
    pub grid: Grid<F>,
    /// Completed passes over the interior. For the lockcell backend this is
    /// the largest sweep count any worker performed.
    pub rounds: usize,
    /// Whether the run stopped because its convergence policy was satisfied
    /// rather than because the round cap was exhausted.
    pub converged: bool,
}

/// Relaxes the grid with the backend selected in the settings.
///
/// ```
/// use gridrelax_concepts::Grid;
/// use gridrelax_core::backend::relax;
/// use gridrelax_core::config::{BackendChoice, RelaxSettings};
///
/// let grid: Grid<f64> = Grid::random(16, 1000).unwrap();
/// let settings = RelaxSettings::new(4, 1e-3)
///     .unwrap()
///     .with_backend(BackendChoice::Banded);
/// let outcome = relax(grid, &settings).unwrap();
/// assert!(outcome.converged);
/// ```
pub fn relax<F>(grid: Grid<F>, settings: &RelaxSettings<F>) -> Result<RelaxOutcome<F>, RelaxError>
where
    F: lockcell::AtomicStore + Send + Sync,
{
    match settings.backend {
        BackendChoice::LockCell => lockcell::relax_lockcell(grid, settings),
        BackendChoice::Jacobi => jacobi::relax_jacobi(grid, settings),
        BackendChoice::Banded => banded::relax_banded(grid, settings),
    }
}
