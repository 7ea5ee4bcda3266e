//! Message-passing backend over row bands.
//!
//! The grid interior is cut into contiguous row bands, one per worker
//! thread, and no memory is shared: workers own their band buffers and talk
//! exclusively through channels. Neighbouring workers trade edge rows as
//! halos after every pass while the coordinator on the calling thread
//! gathers one [ConvergenceVote] per worker per round, ANDs them together
//! and broadcasts the continue/stop decision.
//!
//! A failing worker drops its channel endpoints, which surfaces as a receive
//! error on the coordinator; the coordinator then drops the decision
//! senders, unblocking every remaining worker with an error of its own, so
//! the run aborts instead of hanging.

mod flow;
mod worker;

pub use flow::*;
pub use worker::*;

use num::Float;

use gridrelax_concepts::{partition_rows, CalcError, Grid, IndexError};

use crate::backend::{RelaxError, RelaxOutcome};
use crate::config::RelaxSettings;
use crate::time::RoundCounter;

/// Coordinator side of one run: gathers votes, takes the round decision and
/// stitches the final bands back into the grid.
struct Coordinator<F> {
    /// Decision broadcast ends, one per worker.
    decision_senders: Vec<crossbeam_channel::Sender<bool>>,
    /// Vote channels, one per worker so a dead worker is detected.
    vote_receivers: Vec<crossbeam_channel::Receiver<ConvergenceVote>>,
    /// Result channels, one per worker.
    result_receivers: Vec<crossbeam_channel::Receiver<BandResult<F>>>,
    /// Round counting and cap enforcement.
    counter: RoundCounter,
    /// Progress bar when requested.
    bar: Option<kdam::Bar>,
}

impl<F> Coordinator<F>
where
    F: Float,
{
    /// Runs the per-round vote loop until convergence or cap exhaustion.
    /// Returns the number of completed rounds and the convergence verdict.
    fn decide_rounds(&mut self) -> Result<(usize, bool), RelaxError> {
        loop {
            self.counter.advance();
            let mut all_quiet = true;
            for receiver in self.vote_receivers.iter() {
                all_quiet &= receiver.recv()?.quiet;
            }
            if let Some(bar) = self.bar.as_mut() {
                self.counter.update_bar(bar)?;
            }
            let stop = all_quiet || self.counter.exhausted();
            for sender in self.decision_senders.iter() {
                sender.send(!stop)?;
            }
            if stop {
                return Ok((self.counter.round(), all_quiet));
            }
        }
    }

    /// Collects every worker's final rows into the grid.
    fn gather_results(&mut self, grid: &mut Grid<F>) -> Result<(), RelaxError> {
        for receiver in self.result_receivers.iter() {
            let result = receiver.recv()?;
            grid.write_interior_rows(&result.partition, &result.rows)?;
        }
        Ok(())
    }
}

/// Relaxes the grid with one message-passing worker per row band.
pub fn relax_banded<F>(
    grid: Grid<F>,
    settings: &RelaxSettings<F>,
) -> Result<RelaxOutcome<F>, RelaxError>
where
    F: Float + Send,
{
    let dim = grid.dim();
    let partitions = partition_rows(dim, settings.n_workers)?;
    let n_ranks = partitions.len();
    let map = band_neighbour_map(n_ranks);
    let mut comms = ChannelComm::<usize, HaloRow<F>>::from_map(&map)?;

    let mut grid = grid;
    let outcome = std::thread::scope(|s| {
        let mut handles = Vec::with_capacity(n_ranks);
        let mut decision_senders = Vec::with_capacity(n_ranks);
        let mut vote_receivers = Vec::with_capacity(n_ranks);
        let mut result_receivers = Vec::with_capacity(n_ranks);
        for (rank, partition) in partitions.iter().copied().enumerate() {
            let (assignment_tx, assignment_rx) = crossbeam_channel::unbounded();
            let (decision_tx, decision_rx) = crossbeam_channel::unbounded();
            let (vote_tx, vote_rx) = crossbeam_channel::unbounded();
            let (result_tx, result_rx) = crossbeam_channel::unbounded();
            let comm = comms.remove(&rank).ok_or(IndexError(format!(
                "no communicator was constructed for rank {}",
                rank
            )))?;
            let band_worker = BandWorker {
                rank,
                assignment_rx,
                decision_rx,
                vote_tx,
                result_tx,
                comm,
            };
            assignment_tx.send(BandAssignment {
                partition,
                dim,
                precision: settings.precision,
                band: grid.band_with_halo(&partition),
            })?;
            handles.push(s.spawn(move || band_worker.run()));
            decision_senders.push(decision_tx);
            vote_receivers.push(vote_rx);
            result_receivers.push(result_rx);
        }

        let counter = RoundCounter::new(settings.max_rounds);
        let bar = match settings.show_progress {
            true => Some(counter.initialize_bar()?),
            false => None,
        };
        let mut coordinator = Coordinator {
            decision_senders,
            vote_receivers,
            result_receivers,
            counter,
            bar,
        };
        let (rounds, converged) = coordinator.decide_rounds()?;
        coordinator.gather_results(&mut grid)?;

        for handle in handles {
            handle
                .join()
                .map_err(|_| CalcError("a band worker panicked".to_string()))??;
        }
        Ok::<_, RelaxError>((rounds, converged))
    });
    let (rounds, converged) = outcome?;
    Ok(RelaxOutcome {
        grid,
        rounds,
        converged,
    })
}
