//! Barrier-synchronised threaded backend over a per-worker double buffer.
//!
//! Each worker owns one row band with a private pair of band buffers and the
//! workers advance in lockstep rounds: publish edge rows, barrier, read the
//! neighbours' edge rows as halos, compute the next buffer, vote, barrier,
//! rank 0 decides, barrier. One pass therefore reads only values of the
//! previous pass and the result is deterministic for a given input grid,
//! unlike the free-running [lockcell](crate::backend::lockcell) sweeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use num::Float;

use gridrelax_concepts::{
    partition_rows, relax_row, ConvergencePolicy, Grid, Partition, RoundConvergence,
};

use crate::backend::{RelaxError, RelaxOutcome};
use crate::config::RelaxSettings;
use crate::time::RoundCounter;

/// Pair of hand-over slots for one internal edge between two adjacent row
/// bands.
struct EdgeSlots<F> {
    /// Last owned row of the band above the edge, read as the upper halo of
    /// the band below it.
    from_above: Mutex<Vec<F>>,
    /// First owned row of the band below the edge, read as the lower halo of
    /// the band above it.
    from_below: Mutex<Vec<F>>,
}

impl<F> EdgeSlots<F>
where
    F: Float,
{
    /// Fresh slot pair holding zeroed rows of width `dim`.
    fn new(dim: usize) -> Self {
        Self {
            from_above: Mutex::new(vec![F::zero(); dim]),
            from_below: Mutex::new(vec![F::zero(); dim]),
        }
    }
}

/// Flags shared by all ranks of one run.
struct RoundFlags {
    /// Accumulates the per-rank convergence votes of the current round.
    /// Reset to `true` by rank 0 when it takes the decision.
    all_quiet: AtomicBool,
    /// Decision flag telling every rank to leave its round loop.
    done: AtomicBool,
}

impl RoundFlags {
    /// Flags for the start of a run.
    fn new() -> Self {
        Self {
            all_quiet: AtomicBool::new(true),
            done: AtomicBool::new(false),
        }
    }
}

/// Outcome facts only rank 0 knows.
struct RunSummary {
    /// Completed lockstep rounds.
    rounds: usize,
    /// Whether the final round was fully quiet.
    converged: bool,
}

/// Copies `row` out of a locked slot. A poisoned slot still holds a fully
/// written row from the round that panicked, so the poison flag is dropped.
fn read_slot<F>(slot: &Mutex<Vec<F>>, row: &mut [F])
where
    F: Float,
{
    let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    row.copy_from_slice(&guard);
}

/// Copies `row` into a slot for the neighbouring rank to pick up.
fn write_slot<F>(slot: &Mutex<Vec<F>>, row: &[F])
where
    F: Float,
{
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    guard.copy_from_slice(row);
}

/// One rank of the lockstep round loop.
struct JacobiWorker<'a, F>
where
    F: Float,
{
    /// Position of this rank among all bands, top to bottom.
    rank: usize,
    /// Total number of ranks.
    n_ranks: usize,
    /// Row width of the grid.
    dim: usize,
    /// Rows owned by this rank.
    partition: Partition,
    /// Band buffer holding the owned rows framed by two halo rows.
    current: Vec<F>,
    /// Scratch buffer of the same shape written during a pass.
    next: Vec<F>,
    /// Lockstep barrier handle.
    barrier: hurdles::Barrier,
    /// Shared vote and decision flags.
    flags: &'a RoundFlags,
    /// Hand-over slots of all internal edges.
    edges: &'a [EdgeSlots<F>],
    /// Convergence precision.
    precision: F,
}

impl<F> JacobiWorker<'_, F>
where
    F: Float,
{
    /// Borrows buffer row `index` of the band.
    fn buffer_row(buffer: &[F], dim: usize, index: usize) -> &[F] {
        &buffer[index * dim..(index + 1) * dim]
    }

    /// Publishes the edge rows of the current buffer for the neighbours.
    fn publish_edges(&self) {
        let rows = self.partition.row_count();
        if self.rank > 0 {
            write_slot(
                &self.edges[self.rank - 1].from_below,
                Self::buffer_row(&self.current, self.dim, 1),
            );
        }
        if self.rank < self.n_ranks - 1 {
            write_slot(
                &self.edges[self.rank].from_above,
                Self::buffer_row(&self.current, self.dim, rows),
            );
        }
    }

    /// Pulls the neighbours' published rows into the halo rows of the
    /// current buffer. At grid edges the halo is a fixed border row and is
    /// left untouched.
    fn refresh_halos(&mut self) {
        let rows = self.partition.row_count();
        if self.rank > 0 {
            read_slot(
                &self.edges[self.rank - 1].from_above,
                &mut self.current[0..self.dim],
            );
        }
        if self.rank < self.n_ranks - 1 {
            let lo = (rows + 1) * self.dim;
            read_slot(
                &self.edges[self.rank].from_below,
                &mut self.current[lo..lo + self.dim],
            );
        }
    }

    /// Relaxes all owned rows from `current` into `next` and reports
    /// whether every update stayed below the precision.
    fn relax_pass(&mut self) -> bool {
        let mut policy = RoundConvergence::new(self.precision);
        policy.begin_pass();
        for i in 1..=self.partition.row_count() {
            let out = &mut self.next[i * self.dim..(i + 1) * self.dim];
            relax_row(
                Self::buffer_row(&self.current, self.dim, i - 1),
                Self::buffer_row(&self.current, self.dim, i),
                Self::buffer_row(&self.current, self.dim, i + 1),
                out,
            );
            for col in 1..self.dim - 1 {
                let old_value = self.current[i * self.dim + col];
                policy.observe((out[col] - old_value).abs());
            }
        }
        policy.converged()
    }

    /// Runs the lockstep loop until rank 0 announces the decision to stop.
    /// Returns the owned rows and, on rank 0, the run summary.
    fn run(
        mut self,
        mut counter: RoundCounter,
        mut bar: Option<kdam::Bar>,
    ) -> Result<(Vec<F>, Option<RunSummary>), RelaxError> {
        let mut summary = None;
        loop {
            self.publish_edges();
            self.barrier.wait();
            self.refresh_halos();
            let quiet = self.relax_pass();
            std::mem::swap(&mut self.current, &mut self.next);
            if !quiet {
                self.flags.all_quiet.store(false, Ordering::SeqCst);
            }
            self.barrier.wait();
            if self.rank == 0 {
                counter.advance();
                if let Some(bar) = bar.as_mut() {
                    if let Err(err) = counter.update_bar(bar) {
                        // release the other ranks before bailing out
                        self.flags.done.store(true, Ordering::SeqCst);
                        self.barrier.wait();
                        return Err(err.into());
                    }
                }
                let all_quiet = self.flags.all_quiet.swap(true, Ordering::SeqCst);
                if all_quiet || counter.exhausted() {
                    summary = Some(RunSummary {
                        rounds: counter.round(),
                        converged: all_quiet,
                    });
                    self.flags.done.store(true, Ordering::SeqCst);
                }
            }
            self.barrier.wait();
            if self.flags.done.load(Ordering::SeqCst) {
                break;
            }
        }
        let rows = self.partition.row_count();
        let owned = self.current[self.dim..(rows + 1) * self.dim].to_vec();
        Ok((owned, summary))
    }
}

/// Relaxes the grid with lockstep barrier rounds over row bands.
pub fn relax_jacobi<F>(
    grid: Grid<F>,
    settings: &RelaxSettings<F>,
) -> Result<RelaxOutcome<F>, RelaxError>
where
    F: Float + Send + Sync,
{
    let dim = grid.dim();
    let partitions = partition_rows(dim, settings.n_workers)?;
    let n_ranks = partitions.len();
    let flags = RoundFlags::new();
    let edges: Vec<EdgeSlots<F>> = (0..n_ranks.saturating_sub(1))
        .map(|_| EdgeSlots::new(dim))
        .collect();
    let barrier = hurdles::Barrier::new(n_ranks);

    let mut results: Vec<Option<Result<(Vec<F>, Option<RunSummary>), RelaxError>>> =
        (0..n_ranks).map(|_| None).collect();
    std::thread::scope(|s| {
        for ((rank, partition), slot) in partitions.iter().copied().enumerate().zip(&mut results) {
            let band = grid.band_with_halo(&partition);
            let worker = JacobiWorker {
                rank,
                n_ranks,
                dim,
                partition,
                next: band.clone(),
                current: band,
                barrier: barrier.clone(),
                flags: &flags,
                edges: &edges,
                precision: settings.precision,
            };
            let counter = RoundCounter::new(settings.max_rounds);
            let bar = match (rank, settings.show_progress) {
                (0, true) => Some(counter.initialize_bar()?),
                _ => None,
            };
            s.spawn(move || {
                *slot = Some(worker.run(counter, bar));
            });
        }
        Ok::<(), RelaxError>(())
    })?;

    let mut grid = grid;
    let mut summary = None;
    for (partition, result) in partitions.iter().zip(results) {
        let (rows, rank_summary) = result.ok_or_else(|| {
            gridrelax_concepts::CalcError("a rank exited without reporting".to_string())
        })??;
        grid.write_interior_rows(partition, &rows)?;
        summary = summary.or(rank_summary);
    }
    let summary = summary.ok_or_else(|| {
        gridrelax_concepts::CalcError("rank 0 did not report a run summary".to_string())
    })?;
    Ok(RelaxOutcome {
        grid,
        rounds: summary.rounds,
        converged: summary.converged,
    })
}
