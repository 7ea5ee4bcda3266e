//! The row-band worker and its wire messages.

use crossbeam_channel::{Receiver, Sender};
use num::Float;
use serde::{Deserialize, Serialize};

use gridrelax_concepts::{relax_row, ConvergencePolicy, Partition, RoundConvergence};

use crate::backend::banded::flow::ChannelComm;
use crate::backend::RelaxError;

/// Hands a worker everything it needs for a run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BandAssignment<F> {
    /// Rows owned by the worker.
    pub partition: Partition,
    /// Row width of the grid.
    pub dim: usize,
    /// Convergence precision.
    pub precision: F,
    /// Initial values of the owned rows framed by the two halo rows.
    pub band: Vec<F>,
}

/// One freshly computed edge row travelling to a neighbouring worker.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HaloRow<F> {
    /// Rank of the sending worker.
    pub from: usize,
    /// Full row of values including the fixed border columns.
    pub values: Vec<F>,
}

/// Per-round convergence verdict of one worker.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ConvergenceVote {
    /// Rank of the voting worker.
    pub rank: usize,
    /// Whether every update of the worker's pass stayed below the precision.
    pub quiet: bool,
}

/// Final owned rows of one worker, sent after the stop decision.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BandResult<F> {
    /// Rows the values belong to.
    pub partition: Partition,
    /// Owned rows without halos, in grid order.
    pub rows: Vec<F>,
}

/// One worker of the message-passing backend.
///
/// After receiving its [BandAssignment] the worker loops through rounds of
/// relax, halo exchange, vote and decision:
///
/// 1. relax all owned rows into the scratch buffer and swap,
/// 2. send the new edge rows to both neighbours (never blocks),
/// 3. receive exactly one [HaloRow] per neighbour into the halo rows,
/// 4. send a [ConvergenceVote] and block on the coordinator's decision.
///
/// Voting only after the halo receive is what keeps rounds separated: a
/// neighbour can start its next pass only after the coordinator's decision,
/// which in turn requires this worker's vote, so no halo of a later round
/// can sit in the queue while rows of the current one are still expected.
pub struct BandWorker<F> {
    /// Position of this worker among all bands, top to bottom.
    pub rank: usize,
    /// Delivers the single [BandAssignment] at the start of the run.
    pub assignment_rx: Receiver<BandAssignment<F>>,
    /// Delivers one continue/stop decision per round.
    pub decision_rx: Receiver<bool>,
    /// Carries this worker's vote to the coordinator.
    pub vote_tx: Sender<ConvergenceVote>,
    /// Carries the final rows to the coordinator.
    pub result_tx: Sender<BandResult<F>>,
    /// Halo channels to the neighbouring workers.
    pub comm: ChannelComm<usize, HaloRow<F>>,
}

impl<F> BandWorker<F>
where
    F: Float,
{
    /// Runs rounds until the coordinator sends the stop decision, then
    /// delivers the final rows.
    pub fn run(mut self) -> Result<(), RelaxError> {
        let assignment = self.assignment_rx.recv()?;
        let BandAssignment {
            partition,
            dim,
            precision,
            band,
        } = assignment;
        let rows = partition.row_count();
        let mut current = band;
        let mut next = current.clone();
        let neighbours = self.comm.connections();

        loop {
            let mut policy = RoundConvergence::new(precision);
            policy.begin_pass();
            for i in 1..=rows {
                let out = &mut next[i * dim..(i + 1) * dim];
                relax_row(
                    &current[(i - 1) * dim..i * dim],
                    &current[i * dim..(i + 1) * dim],
                    &current[(i + 1) * dim..(i + 2) * dim],
                    out,
                );
                for col in 1..dim - 1 {
                    policy.observe((out[col] - current[i * dim + col]).abs());
                }
            }
            std::mem::swap(&mut current, &mut next);

            for &neighbour in neighbours.iter() {
                let edge = if neighbour < self.rank { 1 } else { rows };
                self.comm.send(
                    &neighbour,
                    HaloRow {
                        from: self.rank,
                        values: current[edge * dim..(edge + 1) * dim].to_vec(),
                    },
                )?;
            }
            for _ in 0..neighbours.len() {
                let halo = self.comm.receive_blocking()?;
                let target = if halo.from < self.rank { 0 } else { rows + 1 };
                current[target * dim..(target + 1) * dim].copy_from_slice(&halo.values);
            }

            self.vote_tx.send(ConvergenceVote {
                rank: self.rank,
                quiet: policy.converged(),
            })?;
            if !self.decision_rx.recv()? {
                break;
            }
        }

        self.result_tx.send(BandResult {
            partition,
            rows: current[dim..(rows + 1) * dim].to_vec(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::banded::flow::{band_neighbour_map, FromMap};
    use gridrelax_concepts::Grid;

    /// Drives a single worker by hand through two rounds.
    #[test]
    fn worker_votes_and_delivers_its_rows() -> Result<(), Box<dyn std::error::Error>> {
        let grid: Grid<f64> = Grid::from_fn(4, |row, _| (row * row) as f64)?;
        let partition = Partition {
            start_row: 1,
            end_row: 2,
        };
        let mut comms = ChannelComm::from_map(&band_neighbour_map(1))?;
        let (assignment_tx, assignment_rx) = crossbeam_channel::unbounded();
        let (decision_tx, decision_rx) = crossbeam_channel::unbounded();
        let (vote_tx, vote_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let worker = BandWorker {
            rank: 0,
            assignment_rx,
            decision_rx,
            vote_tx,
            result_tx,
            comm: comms.remove(&0).unwrap(),
        };
        assignment_tx.send(BandAssignment {
            partition,
            dim: 4,
            precision: 1e-9,
            band: grid.band_with_halo(&partition),
        })?;
        decision_tx.send(true)?;
        decision_tx.send(false)?;

        let handle = std::thread::spawn(move || worker.run());

        let first = vote_rx.recv()?;
        assert_eq!(first.rank, 0);
        assert!(!first.quiet);
        let _second = vote_rx.recv()?;

        let result = result_rx.recv()?;
        assert_eq!(result.partition, partition);
        assert_eq!(result.rows.len(), 2 * 4);
        handle.join().unwrap()?;
        Ok(())
    }

    /// A worker whose coordinator disappears must error out instead of
    /// blocking forever.
    #[test]
    fn worker_aborts_when_the_coordinator_is_gone() {
        let mut comms = ChannelComm::<usize, HaloRow<f64>>::from_map(&band_neighbour_map(1)).unwrap();
        let (assignment_tx, assignment_rx) = crossbeam_channel::unbounded::<BandAssignment<f64>>();
        let (_decision_tx, decision_rx) = crossbeam_channel::unbounded();
        let (vote_tx, _vote_rx) = crossbeam_channel::unbounded();
        let (result_tx, _result_rx) = crossbeam_channel::unbounded();
        let worker = BandWorker {
            rank: 0,
            assignment_rx,
            decision_rx,
            vote_tx,
            result_tx,
            comm: comms.remove(&0).unwrap(),
        };
        drop(assignment_tx);
        assert!(worker.run().is_err());
    }
}
