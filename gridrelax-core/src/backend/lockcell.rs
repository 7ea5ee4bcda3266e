//! Shared-memory backend with a per-cell lock table.
//!
//! Every worker repeatedly sweeps the full grid interior. A cell update
//! locks only that cell's mutex, so sweeps interleave freely and a worker
//! may average neighbour values another worker refreshed moments earlier.
//! Each worker keeps its own [StreakConvergence] policy and exits as soon
//! as its streak covers one full window of interior cells; the run completes
//! when all workers have joined.
//!
//! Neighbour values are read as relaxed atomic loads instead of taking the
//! neighbour's lock, so no worker ever holds more than one lock.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use num::Float;

use gridrelax_concepts::{CalcError, ConvergencePolicy, Grid, StreakConvergence};

use crate::backend::{RelaxError, RelaxOutcome};
use crate::config::RelaxSettings;
use crate::time::RoundCounter;

/// Float types which can live in a lock-free atomic cell of matching width.
pub trait AtomicStore: Float {
    /// Atomic integer holding the bit pattern of the value.
    type Store: Send + Sync;
    /// Wraps the value into a fresh storage cell.
    fn new_store(self) -> Self::Store;
    /// Reads the value back out of a storage cell.
    fn load(store: &Self::Store) -> Self;
    /// Overwrites the value in a storage cell.
    fn store(self, store: &Self::Store);
}

impl AtomicStore for f64 {
    type Store = AtomicU64;

    fn new_store(self) -> AtomicU64 {
        AtomicU64::new(self.to_bits())
    }

    fn load(store: &AtomicU64) -> f64 {
        f64::from_bits(store.load(Ordering::Relaxed))
    }

    fn store(self, store: &AtomicU64) {
        store.store(self.to_bits(), Ordering::Relaxed)
    }
}

impl AtomicStore for f32 {
    type Store = AtomicU32;

    fn new_store(self) -> AtomicU32 {
        AtomicU32::new(self.to_bits())
    }

    fn load(store: &AtomicU32) -> f32 {
        f32::from_bits(store.load(Ordering::Relaxed))
    }

    fn store(self, store: &AtomicU32) {
        store.store(self.to_bits(), Ordering::Relaxed)
    }
}

/// Grid storage shared by all workers: atomic cells plus a lock table of the
/// same shape. The lock of a cell serialises its read-modify-write cycles;
/// plain neighbour reads bypass the table entirely.
struct SharedCells<F>
where
    F: AtomicStore,
{
    /// Side length N of the grid.
    dim: usize,
    /// Row-major atomic cell values.
    cells: Vec<F::Store>,
    /// Row-major lock table, one mutex per cell.
    locks: Vec<Mutex<()>>,
}

impl<F> SharedCells<F>
where
    F: AtomicStore,
{
    /// Moves a grid into shared storage.
    fn from_grid(grid: &Grid<F>) -> Self {
        Self {
            dim: grid.dim(),
            cells: grid.as_slice().iter().map(|v| v.new_store()).collect(),
            locks: (0..grid.dim() * grid.dim()).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Reads the value at `(row, col)`.
    #[inline]
    fn load(&self, row: usize, col: usize) -> F {
        F::load(&self.cells[row * self.dim + col])
    }

    /// Overwrites the value at `(row, col)`.
    #[inline]
    fn store(&self, row: usize, col: usize, value: F) {
        value.store(&self.cells[row * self.dim + col])
    }

    /// Runs `update` on the cell value while holding that cell's lock and
    /// returns the old and new value.
    fn update_locked(
        &self,
        row: usize,
        col: usize,
        update: impl FnOnce() -> F,
    ) -> Result<(F, F), CalcError> {
        let guard = self.locks[row * self.dim + col]
            .lock()
            .map_err(|_| CalcError(format!("lock of cell ({}, {}) was poisoned", row, col)))?;
        let old_value = self.load(row, col);
        let new_value = update();
        self.store(row, col, new_value);
        drop(guard);
        Ok((old_value, new_value))
    }

    /// Moves the storage back into a plain grid.
    fn into_grid(self) -> Result<Grid<F>, RelaxError> {
        let data = self.cells.iter().map(|store| F::load(store)).collect();
        Ok(Grid::from_raw(self.dim, data)?)
    }
}

/// Per-worker summary returned when a worker joins.
struct WorkerReport {
    /// Number of full interior sweeps the worker started.
    sweeps: usize,
    /// Whether the worker left because its streak was complete.
    converged: bool,
}

/// One worker's sweep loop: average each interior cell in place until the
/// worker's own quiet streak spans the whole interior.
fn relaxation_worker<F>(
    cells: &SharedCells<F>,
    precision: F,
    max_rounds: Option<usize>,
) -> Result<WorkerReport, RelaxError>
where
    F: AtomicStore,
{
    let mut policy = StreakConvergence::for_grid(precision, cells.dim);
    let mut counter = RoundCounter::new(max_rounds);
    let quarter = (F::one() + F::one() + F::one() + F::one()).recip();
    while !policy.converged() {
        if !counter.advance() {
            return Ok(WorkerReport {
                sweeps: counter.round() - 1,
                converged: false,
            });
        }
        policy.begin_pass();
        'sweep: for row in 1..cells.dim - 1 {
            for col in 1..cells.dim - 1 {
                let (old_value, new_value) = cells.update_locked(row, col, || {
                    let sum = cells.load(row - 1, col)
                        + cells.load(row + 1, col)
                        + cells.load(row, col - 1)
                        + cells.load(row, col + 1);
                    sum * quarter
                })?;
                policy.observe((old_value - new_value).abs());
                if policy.converged() {
                    break 'sweep;
                }
            }
        }
    }
    Ok(WorkerReport {
        sweeps: counter.round(),
        converged: true,
    })
}

/// Relaxes the grid with `settings.n_workers` asynchronous sweep workers.
pub fn relax_lockcell<F>(
    grid: Grid<F>,
    settings: &RelaxSettings<F>,
) -> Result<RelaxOutcome<F>, RelaxError>
where
    F: AtomicStore + Send + Sync,
{
    let cells = SharedCells::from_grid(&grid);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.n_workers)
        .build()?;
    let precision = settings.precision;
    let max_rounds = settings.max_rounds;
    let mut reports: Vec<Option<Result<WorkerReport, RelaxError>>> =
        (0..settings.n_workers).map(|_| None).collect();
    pool.scope(|s| {
        for slot in reports.iter_mut() {
            let cells = &cells;
            s.spawn(move |_| {
                *slot = Some(relaxation_worker(cells, precision, max_rounds));
            });
        }
    });

    let mut rounds = 0;
    let mut converged = true;
    for report in reports {
        let report = report
            .ok_or_else(|| CalcError("a worker exited without reporting".to_string()))??;
        rounds = rounds.max(report.sweeps);
        converged &= report.converged;
    }
    Ok(RelaxOutcome {
        grid: cells.into_grid()?,
        rounds,
        converged,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::BackendChoice;
    use gridrelax_concepts::four_point_average;

    fn settings(n_workers: usize, precision: f64) -> RelaxSettings<f64> {
        RelaxSettings::new(n_workers, precision)
            .unwrap()
            .with_backend(BackendChoice::LockCell)
    }

    #[test]
    fn atomic_store_round_trips_special_values() {
        for value in [0.0f64, -1.5, f64::MAX, f64::MIN_POSITIVE] {
            let store = value.new_store();
            assert_eq!(f64::load(&store), value);
        }
        let store = 2.25f32.new_store();
        2.5f32.store(&store);
        assert_eq!(f32::load(&store), 2.5);
    }

    #[test]
    fn constant_grid_converges_immediately() {
        let grid: Grid<f64> = Grid::new(8, 5.0).unwrap();
        let outcome = relax_lockcell(grid.clone(), &settings(4, 1e-6)).unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.grid, grid);
    }

    #[test]
    fn result_is_stable_under_the_stencil() {
        let grid: Grid<f64> = Grid::random(12, 1000).unwrap();
        let precision = 1e-3;
        let outcome = relax_lockcell(grid, &settings(3, precision)).unwrap();
        assert!(outcome.converged);
        // neighbours can take further quiet updates after a cell's last
        // visit, so the residual may exceed a single update's precision
        for (row, col) in outcome.grid.interior() {
            let diff =
                (four_point_average(&outcome.grid, row, col) - outcome.grid.get(row, col)).abs();
            assert!(diff < precision * 10.0);
        }
    }

    #[test]
    fn border_cells_are_never_touched() {
        let grid: Grid<f64> = Grid::random(10, 3).unwrap();
        let outcome = relax_lockcell(grid.clone(), &settings(4, 1e-2)).unwrap();
        let dim = grid.dim();
        for i in 0..dim {
            assert_eq!(outcome.grid.get(0, i), grid.get(0, i));
            assert_eq!(outcome.grid.get(dim - 1, i), grid.get(dim - 1, i));
            assert_eq!(outcome.grid.get(i, 0), grid.get(i, 0));
            assert_eq!(outcome.grid.get(i, dim - 1), grid.get(i, dim - 1));
        }
    }

    #[test]
    fn round_cap_reports_an_unconverged_run() {
        let grid: Grid<f64> = Grid::random(40, 9).unwrap();
        let capped = settings(2, 1e-12).with_max_rounds(Some(1));
        let outcome = relax_lockcell(grid, &capped).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.rounds, 1);
    }

    #[test]
    fn works_with_f32_cells() {
        let grid: Grid<f32> = Grid::random(8, 11).unwrap();
        let config = RelaxSettings::new(2, 1e-2f32).unwrap();
        let outcome = relax_lockcell(grid, &config).unwrap();
        assert!(outcome.converged);
    }
}
